use anyhow::Result;
use sales_etl::core::etl::{AbortReason, PipelineState};
use sales_etl::utils::logger::MemoryReporter;
use sales_etl::{EtlConfig, EtlEngine, LocalStorage, RunStatus, SalesPipeline};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const SALES_CSV: &str = "order_id,price,quantity,category,customer_email,region\n\
    1001,10,5, Electronics ,,north\n\
    1002,abc,2,Food,chef@example.com,south\n\
    1003,50,,toys,,east\n\
    1004,75,2,Books,reader@example.com,west\n\
    1005,40,5,  BOOKS,,north\n\
    1006,250.5,2,Electronics,buyer@example.com,south\n\
    1007,99.99,1,Garden,,east\n";

fn write_input(dir: &TempDir, name: &str, content: &str) {
    std::fs::write(dir.path().join(name), content).unwrap();
}

fn config_for(dir: &TempDir) -> EtlConfig {
    let mut config = EtlConfig::default();
    config.source.path = dir.path().join("sales_data.csv").display().to_string();
    config.load.output_dir = dir.path().join("output").display().to_string();
    config
}

#[test]
fn test_end_to_end_writes_cleaned_csv_and_summary_json() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_input(&temp_dir, "sales_data.csv", SALES_CSV);

    let reporter = Arc::new(MemoryReporter::new());
    let pipeline = SalesPipeline::new(LocalStorage::default(), config_for(&temp_dir))
        .with_reporter(reporter.clone());
    let report = EtlEngine::new(pipeline).run();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(
        report.states,
        vec![
            PipelineState::Start,
            PipelineState::Loaded,
            PipelineState::Cleaned,
            PipelineState::Written,
            PipelineState::End
        ]
    );
    assert_eq!(report.rows_extracted, 7);
    assert_eq!(report.rows_cleaned, 3);

    let cleaned_path = temp_dir.path().join("output/cleaned_sales_data.csv");
    let cleaned = std::fs::read_to_string(&cleaned_path)?;
    let lines: Vec<&str> = cleaned.lines().collect();
    assert_eq!(
        lines,
        vec![
            "order_id,price,quantity,category,customer_email,region,total_sales",
            "1004,75,2,books,reader@example.com,west,150.0",
            "1005,40,5,books,Unknown,north,200.0",
            "1006,250.5,2,electronics,buyer@example.com,south,501.0",
        ]
    );

    let summary_path = temp_dir.path().join("output/category_summary.json");
    let summary: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&summary_path)?)?;
    assert_eq!(
        summary,
        serde_json::json!([
            {"category": "books", "total_revenue": 350.0},
            {"category": "electronics", "total_revenue": 501.0}
        ])
    );

    // Input stays unless deletion is requested.
    assert!(temp_dir.path().join("sales_data.csv").exists());
    assert_eq!(reporter.conditions("write_failure").len(), 0);
    Ok(())
}

#[test]
fn test_empty_input_file_aborts_without_outputs() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_input(&temp_dir, "sales_data.csv", "");

    let reporter = Arc::new(MemoryReporter::new());
    let pipeline = SalesPipeline::new(LocalStorage::default(), config_for(&temp_dir))
        .with_reporter(reporter.clone());
    let report = EtlEngine::new(pipeline).run();

    assert_eq!(report.status, RunStatus::Aborted(AbortReason::NoData));
    assert_eq!(report.status.exit_code(false), 0);
    assert_eq!(report.status.exit_code(true), 2);
    assert!(!temp_dir.path().join("output").exists());
    assert_eq!(reporter.conditions("load_failure").len(), 1);
    Ok(())
}

#[test]
fn test_header_only_input_aborts() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_input(
        &temp_dir,
        "sales_data.csv",
        "price,quantity,category,customer_email\n",
    );

    let pipeline = SalesPipeline::new(LocalStorage::default(), config_for(&temp_dir))
        .with_reporter(Arc::new(MemoryReporter::new()));
    let report = EtlEngine::new(pipeline).run();

    assert_eq!(report.status, RunStatus::Aborted(AbortReason::NoData));
    assert_eq!(
        report.states,
        vec![PipelineState::Start, PipelineState::Aborted, PipelineState::End]
    );
    Ok(())
}

#[test]
fn test_missing_input_aborts() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let reporter = Arc::new(MemoryReporter::new());
    let pipeline = SalesPipeline::new(LocalStorage::default(), config_for(&temp_dir))
        .with_reporter(reporter.clone());
    let report = EtlEngine::new(pipeline).run();

    assert_eq!(report.status, RunStatus::Aborted(AbortReason::NoData));
    assert_eq!(reporter.conditions("source_not_found").len(), 1);
    Ok(())
}

#[test]
fn test_all_rows_filtered_aborts_after_cleaning() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_input(
        &temp_dir,
        "sales_data.csv",
        "price,quantity,category,customer_email\n10,5, Electronics ,\nabc,2,Food,\n50,,toys,\n",
    );

    let pipeline = SalesPipeline::new(LocalStorage::default(), config_for(&temp_dir))
        .with_reporter(Arc::new(MemoryReporter::new()));
    let report = EtlEngine::new(pipeline).run();

    assert_eq!(report.status, RunStatus::Aborted(AbortReason::NoValidData));
    assert!(!temp_dir
        .path()
        .join("output/cleaned_sales_data.csv")
        .exists());
    Ok(())
}

#[test]
fn test_delete_input_on_success_is_opt_in() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_input(&temp_dir, "sales_data.csv", SALES_CSV);

    let mut config = config_for(&temp_dir);
    config.source.delete_on_success = Some(true);
    let pipeline = SalesPipeline::new(LocalStorage::default(), config)
        .with_reporter(Arc::new(MemoryReporter::new()));
    let report = EtlEngine::new(pipeline).run();

    assert!(report.is_success());
    assert!(!temp_dir.path().join("sales_data.csv").exists());
    assert!(temp_dir
        .path()
        .join("output/cleaned_sales_data.csv")
        .exists());
    Ok(())
}

#[test]
fn test_toml_config_with_tab_delimiter_and_json_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_input(
        &temp_dir,
        "sales.tsv",
        "price\tquantity\tcategory\tcustomer_email\n120\t1\tToys\t\n",
    );

    let base = temp_dir.path().display().to_string().replace('\\', "/");
    let config_content = format!(
        r#"
[pipeline]
name = "tsv-run"

[source]
path = "{base}/sales.tsv"
delimiter = "\t"

[load]
output_dir = "{base}/out"
summary_enabled = false

[load.cleaned]
filename = "cleaned.json"
format = "json"
"#
    );
    let config_path = temp_dir.path().join("etl.toml");
    std::fs::write(&config_path, config_content)?;
    let config = EtlConfig::from_file(&config_path)?;

    let pipeline = SalesPipeline::new(LocalStorage::default(), config)
        .with_reporter(Arc::new(MemoryReporter::new()));
    let report = EtlEngine::new(pipeline).run();

    assert!(report.is_success());
    assert_eq!(report.outputs.written.len(), 1);
    assert!(!Path::new(&format!("{base}/out/category_summary.json")).exists());

    let cleaned: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(temp_dir.path().join("out/cleaned.json"))?)?;
    assert_eq!(
        cleaned,
        serde_json::json!([{
            "price": 120,
            "quantity": 1,
            "category": "toys",
            "customer_email": "Unknown",
            "total_sales": 120.0
        }])
    );
    Ok(())
}
