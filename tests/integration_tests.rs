use std::io::Read;
use tempfile::TempDir;
use warehouse_etl::core::{Pipeline, SourceFormat};
use warehouse_etl::{CliConfig, EtlEngine, FileRecordSource, LocalStorage, WarehousePipeline};

const PALLETS_JSON: &str = r#"[
    {"id": 1, "width": 10, "height": 2, "depth": 8, "boxes": [
        {"id": 11, "width": 4, "height": 4, "depth": 4, "weight": 5, "production_date": "2024-01-15T00:00:00"},
        {"id": 12, "width": 12, "height": 1, "depth": 12, "weight": 5, "production_date": "2024-01-15T00:00:00"}
    ]},
    {"id": 2, "width": -4, "height": 2, "depth": 8, "boxes": [
        {"id": 21, "width": 1, "height": 1, "depth": 1, "weight": 1, "production_date": "2024-02-15T00:00:00"}
    ]},
    {"id": 3, "width": 6, "height": 1, "depth": 6, "boxes": [
        {"id": 31, "width": 2, "height": 2, "depth": 2, "weight": 3, "production_date": "2024-01-15T00:00:00"},
        null
    ]},
    {"id": 4, "width": 6, "height": 1, "depth": 6, "boxes": []}
]"#;

fn read_entry(archive: &mut zip::ZipArchive<std::io::Cursor<Vec<u8>>>, name: &str) -> String {
    let mut file = archive.by_name(name).unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    content
}

fn cli_config(source_path: String, output_path: String) -> CliConfig {
    CliConfig {
        source_path,
        source_format: SourceFormat::Json,
        output_path,
        archive_name: "fleet_report.zip".to_string(),
        quiet: true,
        verbose: false,
        monitor: false,
    }
}

#[tokio::test]
async fn test_end_to_end_json_source() {
    let temp_dir = TempDir::new().unwrap();
    let source_path = temp_dir.path().join("pallets.json");
    std::fs::write(&source_path, PALLETS_JSON).unwrap();
    let output_path = temp_dir.path().join("out").to_str().unwrap().to_string();

    let config = cli_config(source_path.to_str().unwrap().to_string(), output_path.clone());
    let source = FileRecordSource::from_config(LocalStorage::default(), &config);
    let storage = LocalStorage::new(output_path.clone());
    let pipeline = WarehousePipeline::new(storage, source, config);

    let engine = EtlEngine::new(pipeline);
    let result = engine.run().await.unwrap();

    assert!(result.ends_with("fleet_report.zip"));
    let zip_path = std::path::Path::new(&output_path).join("fleet_report.zip");
    assert!(zip_path.exists());

    let zip_data = std::fs::read(&zip_path).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    assert_eq!(archive.len(), 3);

    // Pallets 1 and 3 share an expiry date; 3 is lighter (33 vs 35).
    let groups = read_entry(&mut archive, "expiry_groups.csv");
    let rows: Vec<&str> = groups.lines().skip(1).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with("2024-04-24T00:00:00,3,33.0,"));
    assert!(rows[1].starts_with("2024-04-24T00:00:00,1,35.0,"));

    let freshest = read_entry(&mut archive, "freshest_pallets.csv");
    let rows: Vec<&str> = freshest.lines().skip(1).collect();
    assert_eq!(rows, vec![
        "1,3,2024-04-24T00:00:00,44.0,33.0",
        "2,1,2024-04-24T00:00:00,224.0,35.0",
    ]);

    let discarded: serde_json::Value =
        serde_json::from_str(&read_entry(&mut archive, "discarded.json")).unwrap();
    let discards = discarded["discards"].as_array().unwrap();
    let stages: Vec<&str> = discards.iter().map(|d| d["stage"].as_str().unwrap()).collect();
    assert_eq!(
        stages,
        vec!["box_placement", "pallet_construction", "box_placement", "pallet_validation"]
    );
}

#[tokio::test]
async fn test_end_to_end_missing_source_fails() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();
    let source_path = temp_dir.path().join("missing.json").to_str().unwrap().to_string();

    let config = cli_config(source_path, output_path.clone());
    let source = FileRecordSource::from_config(LocalStorage::default(), &config);
    let pipeline = WarehousePipeline::new(LocalStorage::new(output_path), source, config);

    let result = EtlEngine::new(pipeline).run().await;

    let err = result.unwrap_err();
    assert!(matches!(err, warehouse_etl::EtlError::IoError(_)));
    assert!(!temp_dir.path().join("fleet_report.zip").exists());
}

#[tokio::test]
async fn test_end_to_end_with_monitoring() {
    let temp_dir = TempDir::new().unwrap();
    let source_path = temp_dir.path().join("pallets.json");
    std::fs::write(&source_path, "[]").unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let config = cli_config(source_path.to_str().unwrap().to_string(), output_path.clone());
    let source = FileRecordSource::from_config(LocalStorage::default(), &config);
    let pipeline = WarehousePipeline::new(LocalStorage::new(output_path.clone()), source, config);

    let result = EtlEngine::new_with_monitoring(pipeline, true).run().await;

    assert!(result.is_ok());
    let zip_data = std::fs::read(temp_dir.path().join("fleet_report.zip")).unwrap();
    let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    assert_eq!(archive.len(), 2);
}

#[tokio::test]
async fn test_json_null_box_list_and_bad_box_are_accounted_for() {
    let temp_dir = TempDir::new().unwrap();
    let source_path = temp_dir.path().join("pallets.json");
    std::fs::write(
        &source_path,
        r#"[
            {"id": 1, "width": 5, "height": 1, "depth": 5, "boxes": [
                {"id": 10, "width": 1, "height": 1, "depth": 1, "weight": "abc", "production_date": "2024-01-15T00:00:00"},
                {"id": 11, "width": 1, "height": 1, "depth": 1, "weight": 5, "production_date": "2024-01-15T00:00:00"}
            ]},
            {"id": 2, "width": 5, "height": 1, "depth": 5, "boxes": null}
        ]"#,
    )
    .unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let config = cli_config(source_path.to_str().unwrap().to_string(), output_path.clone());
    let source = FileRecordSource::from_config(LocalStorage::default(), &config);
    let pipeline = WarehousePipeline::new(LocalStorage::new(output_path), source, config);

    let records = pipeline.extract().await.unwrap();
    assert_eq!(records.len(), 2);
    let result = pipeline.transform(records).await.unwrap();

    assert_eq!(result.committed_pallets, 1);
    assert_eq!(result.discarded_records, 2);
    let discarded: serde_json::Value =
        serde_json::from_str(result.discarded_json.as_deref().unwrap()).unwrap();
    let discards = discarded["discards"].as_array().unwrap();
    assert_eq!(discards[0]["stage"], "decoding");
    assert_eq!(discards[0]["record"]["box_id"], 10);
    assert_eq!(discards[1]["stage"], "pallet_validation");
    assert_eq!(discards[1]["record"]["pallet_id"], 2);
    assert_eq!(discards[1]["reason"], "invalid state: no boxes available");
}
