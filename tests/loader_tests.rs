use approx::assert_relative_eq;
use cartera_riesgo::config::DashboardConfig;
use cartera_riesgo::data::{
    DataLoader, FilterOptions, FilterState, LoaderError, MonthName, Selection,
};
use cartera_riesgo::metrics::DashboardView;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const HEADER: &str =
    "FechaControl,Departamento,Tipo_credito,Nivel_Riesgo,RDiasMora,DiasMora,SaldoCapital,INDBYM";

fn write_csv(dir: &TempDir, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

fn sample_lines() -> Vec<&'static str> {
    vec![
        HEADER,
        "01/31/2024,Antioquia,Consumo,A. Bajo,A. Al dia,0,1500000.50,Buenos",
        "01/31/2024,Antioquia,Vivienda,C. Alto,C. 31 - 60 dias,45,500000,Malos",
        "02/29/2024,Cundinamarca,Consumo,B. Medio,B. 1 - 30 dias,12.0,750000,Buenos",
        "not a date,Cundinamarca,Consumo,B. Medio,A. Al dia,0,100,Buenos",
        "02/29/2024,Cundinamarca,Consumo,B. Medio,A. Al dia,0,abc,Buenos",
    ]
}

#[test]
fn test_load_normalizes_rows() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "cartera.csv", &sample_lines());

    let dataset = DataLoader::new(b',').load_csv(&path).unwrap();
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.skipped_rows(), 2);

    let first = &dataset.records()[0];
    assert_eq!(first.control_date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    assert_eq!(first.month.name(), "Enero");
    assert_eq!(first.risk_level.to_string(), "Bajo");
    assert_eq!(first.risk_level.rank(), "A");
    assert_relative_eq!(first.balance, 1500000.50);
    assert!(!first.is_delinquent());

    let third = &dataset.records()[2];
    assert_eq!(third.delinquency_days, 12);
    assert!(third.is_delinquent());
    assert_eq!(third.bucket.label(), "B. 1 - 30 dias");
}

#[test]
fn test_load_with_semicolon_separator() {
    let dir = TempDir::new().unwrap();
    let lines: Vec<String> = sample_lines().iter().map(|l| l.replace(',', ";")).collect();
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    let path = write_csv(&dir, "cartera_pc.csv", &lines);

    let config = DashboardConfig {
        separator: ";".to_string(),
        ..DashboardConfig::default()
    };
    let dataset = DataLoader::new(config.separator_byte().unwrap())
        .load_csv(&path)
        .unwrap();
    assert_eq!(dataset.len(), 3);
}

#[test]
fn test_missing_column_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "sin_saldo.csv",
        &[
            "FechaControl,Departamento,Tipo_credito,Nivel_Riesgo,RDiasMora,DiasMora,INDBYM",
            "01/31/2024,Antioquia,Consumo,A. Bajo,A. Al dia,0,Buenos",
        ],
    );

    let err = DataLoader::new(b',').load_csv(&path).unwrap_err();
    assert!(matches!(err, LoaderError::MissingColumn(ref col) if col == "SaldoCapital"));
}

#[test]
fn test_all_rows_invalid_is_no_data() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "invalida.csv",
        &[HEADER, "2024-01-31,Antioquia,Consumo,A. Bajo,A. Al dia,0,100,Buenos"],
    );

    let err = DataLoader::new(b',').load_csv(&path).unwrap_err();
    assert!(matches!(err, LoaderError::NoData));
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = DataLoader::new(b',').load_csv(&dir.path().join("no_existe.csv"));
    assert!(result.is_err());
}

#[test]
fn test_loaded_dataset_drives_dashboard() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "cartera.csv", &sample_lines());
    let dataset = DataLoader::new(b',').load_csv(&path).unwrap();

    let options = FilterOptions::from_records(dataset.records());
    assert_eq!(
        options.months,
        vec![MonthName::parse("enero").unwrap(), MonthName::parse("Febrero").unwrap()]
    );
    assert_eq!(options.regions, vec!["Antioquia", "Cundinamarca"]);
    assert_eq!(options.credit_types, vec!["Consumo", "Vivienda"]);

    let filters = FilterState {
        month: Selection::Only(options.months[0]),
        ..FilterState::all()
    };
    let view = DashboardView::build(&dataset, &filters);
    assert_eq!(view.row_count, 2);
    assert_eq!(view.icv_timeline.points.len(), 1);
    assert_relative_eq!(
        view.icv_timeline.points[0].icv,
        500000.0 / 2000000.5 * 100.0,
        epsilon = 1e-9
    );
}
