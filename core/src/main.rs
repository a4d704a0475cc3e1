use clap::Parser;
use log::{error, info, warn};
use pancdx_core::cli::report::{
    BatchReport, CtReport, HistoryReport, ImageBatchReport, LabReport, ModelListReport,
};
use pancdx_core::cli::{
    BatchArgs, Cli, Command, CtArgs, CtBatchArgs, CtFolderArgs, HistoryAction, OutputFormat,
    PredictArgs,
};
use pancdx_core::imaging::{save_image_results, ImageBatchResult, CT_MODEL_NAME};
use pancdx_core::model::{model_names, DEFAULT_MODEL_NAME};
use pancdx_core::tabular::save_results;
use pancdx_core::{
    parse_field, parse_sex, AnalysisType, AppConfig, BatchImageRunner, BatchTabularRunner,
    DiagnosisError, HistoryStore, ImageClassifier, PatientTable, RawLabMeasurement, Result,
    RowOutcome, TabularPredictor,
};
use serde_json::{json, Map, Value};
use std::path::Path;
use std::process;

fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.config();
    info!("Base path: {}", config.base_path.display());

    match &cli.command {
        Command::Models => list_models(cli.format),
        Command::Predict(args) => predict(cli.format, &config, args),
        Command::Batch(args) => batch(cli.format, &config, args),
        Command::Ct(args) => ct(cli.format, &config, args),
        Command::CtBatch(args) => ct_batch(cli.format, &config, args),
        Command::CtFolder(args) => ct_folder(cli.format, &config, args),
        Command::History { action } => history(cli.format, &config, action),
    }
}

fn list_models(format: OutputFormat) -> Result<()> {
    let names: Vec<&str> = model_names().collect();
    match format {
        OutputFormat::Text => print!("{}", ModelListReport::new(&names, DEFAULT_MODEL_NAME)),
        OutputFormat::Json => print_json(&json!({ "models": names, "default": DEFAULT_MODEL_NAME }))?,
    }
    Ok(())
}

fn predict(format: OutputFormat, config: &AppConfig, args: &PredictArgs) -> Result<()> {
    let raw = RawLabMeasurement::new(
        parse_field("age", &args.age)?,
        parse_sex(&args.sex)?,
        parse_field("creatinine", &args.creatinine)?,
        parse_field("bilirubin", &args.bilirubin)?,
        parse_field("glucose", &args.glucose)?,
        parse_field("urine_volume", &args.urine_volume)?,
        parse_field("urine_pH", &args.urine_ph)?,
    );

    let mut predictor = TabularPredictor::new(config);
    predictor.load_model(&args.model)?;
    let outcome = predictor.predict(&raw)?;

    if !args.no_history {
        record(config, |store| {
            store
                .add_record(
                    &args.patient,
                    AnalysisType::LabTest,
                    &args.model,
                    outcome.diagnosis(),
                    outcome.confidence_percent,
                    raw.to_input_data(),
                )
                .map(|_| ())
        });
    }

    match format {
        OutputFormat::Text => print!("{}", LabReport::new(&args.patient, &args.model, &outcome)),
        OutputFormat::Json => print_json(&json!({
            "patient": args.patient,
            "model": args.model,
            "diagnosis": outcome.diagnosis(),
            "outcome": outcome,
        }))?,
    }
    Ok(())
}

fn batch(format: OutputFormat, config: &AppConfig, args: &BatchArgs) -> Result<()> {
    let table = PatientTable::load(&args.file)?;

    let mut predictor = TabularPredictor::new(config);
    predictor.load_model(&args.model)?;
    let outcomes = BatchTabularRunner::new(&predictor).run_table(&table, args.pre_normalized)?;

    let saved = if args.no_save {
        None
    } else {
        Some(save_results(&table, &outcomes, &config.results_dir())?)
    };

    let names = table.patient_names();
    match format {
        OutputFormat::Text => print!(
            "{}",
            BatchReport::new(&names, &outcomes, saved.as_deref())
        ),
        OutputFormat::Json => {
            let rows: Vec<Value> = names
                .iter()
                .zip(&outcomes)
                .map(|(name, outcome)| match outcome {
                    RowOutcome::Diagnosed(o) => json!({
                        "patient": name,
                        "diagnosis": outcome.label(),
                        "confidence": o.confidence_percent,
                    }),
                    RowOutcome::Failed(e) => json!({
                        "patient": name,
                        "diagnosis": outcome.label(),
                        "error": e.message,
                    }),
                })
                .collect();
            print_json(&json!({ "results": rows, "saved": saved }))?
        }
    }
    Ok(())
}

fn load_ct_classifier(config: &AppConfig, model_path: Option<&Path>) -> Result<ImageClassifier> {
    let path = match model_path {
        Some(path) => path.to_path_buf(),
        None => config.ct_model_path(),
    };
    let mut classifier = ImageClassifier::new();
    classifier.load_model(&path)?;
    Ok(classifier)
}

fn ct(format: OutputFormat, config: &AppConfig, args: &CtArgs) -> Result<()> {
    let classifier = load_ct_classifier(config, args.model_path.as_deref())?;
    let prediction = classifier.predict(&args.image)?;
    let image_name = file_name(&args.image);

    if !args.no_history {
        let mut input = Map::new();
        input.insert(
            "image_path".to_string(),
            Value::String(args.image.display().to_string()),
        );
        record(config, |store| {
            store
                .add_record(
                    &image_name,
                    AnalysisType::CtScan,
                    CT_MODEL_NAME,
                    prediction.diagnosis(),
                    prediction.display_confidence(),
                    input,
                )
                .map(|_| ())
        });
    }

    match format {
        OutputFormat::Text => print!("{}", CtReport::new(&image_name, &prediction)),
        OutputFormat::Json => print_json(&json!({
            "image": image_name,
            "diagnosis": prediction.diagnosis(),
            "display_confidence": prediction.display_confidence(),
            "prediction": prediction,
        }))?,
    }
    Ok(())
}

fn ct_batch(format: OutputFormat, config: &AppConfig, args: &CtBatchArgs) -> Result<()> {
    let classifier = load_ct_classifier(config, args.model_path.as_deref())?;
    let results = BatchImageRunner::new(&classifier).run_batch(&args.images)?;

    let saved = if args.no_save {
        None
    } else {
        Some(save_image_results(&results, &config.results_dir(), None)?)
    };
    print_image_results(format, &results, saved.as_deref())
}

fn ct_folder(format: OutputFormat, config: &AppConfig, args: &CtFolderArgs) -> Result<()> {
    let classifier = load_ct_classifier(config, args.model_path.as_deref())?;
    let results = BatchImageRunner::new(&classifier).run_folder(&args.directory)?;

    let saved = if args.no_save {
        None
    } else {
        let folder = file_name(&args.directory);
        Some(save_image_results(
            &results,
            &config.results_dir(),
            Some(&folder),
        )?)
    };
    print_image_results(format, &results, saved.as_deref())
}

fn print_image_results(
    format: OutputFormat,
    results: &[ImageBatchResult],
    saved: Option<&Path>,
) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", ImageBatchReport::new(results, saved)),
        OutputFormat::Json => {
            let rows: Vec<Value> = results
                .iter()
                .map(|r| {
                    json!({
                        "image": r.image,
                        "diagnosis": r.diagnosis(),
                        "confidence": r.confidence(),
                        "probability": r.probability(),
                    })
                })
                .collect();
            print_json(&json!({ "results": rows, "saved": saved }))?
        }
    }
    Ok(())
}

fn history(format: OutputFormat, config: &AppConfig, action: &HistoryAction) -> Result<()> {
    let mut store = HistoryStore::open(config.history_path())?;

    match action {
        HistoryAction::List { limit } => {
            let records = store.recent(*limit);
            match format {
                OutputFormat::Text => print!(
                    "{}",
                    HistoryReport::new(&records, store.get_record_count())
                ),
                OutputFormat::Json => print_json(&records)?,
            }
        }
        HistoryAction::Count => println!("{}", store.get_record_count()),
        HistoryAction::Export => {
            let path = store.export_to_csv()?;
            println!("History exported to {}", path.display());
        }
        HistoryAction::Clear { yes } => {
            if !yes {
                return Err(DiagnosisError::InvalidInput(
                    "pass --yes to delete all history records".to_string(),
                ));
            }
            let count = store.get_record_count();
            store.clear_history()?;
            println!("Deleted {} history records", count);
        }
    }
    Ok(())
}

/// Records a result in the history; failures are logged, not fatal
fn record<F>(config: &AppConfig, add: F)
where
    F: FnOnce(&mut HistoryStore) -> Result<()>,
{
    let result = HistoryStore::open(config.history_path()).and_then(|mut store| add(&mut store));
    if let Err(e) = result {
        warn!("Could not record history: {}", e);
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
