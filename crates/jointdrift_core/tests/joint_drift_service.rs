mod common;

use common::{create_legacy_store, set_text_cell, standard_rows, LegacyRow};
use jointdrift_core::{
    AggregateJointDriftRepository, CancellationToken, CombinedJointDriftRepository,
    ImportError, InMemoryContext, JointDriftItemDto, JointDriftService,
    LegacyConnectionProvider, LegacyJointDriftRepository, NotFoundError, RepoError,
    SqliteContext,
};

fn service_for(
    provider: &LegacyConnectionProvider,
) -> JointDriftService<CombinedJointDriftRepository<'_, InMemoryContext>> {
    JointDriftService::new(CombinedJointDriftRepository::new(
        AggregateJointDriftRepository::new(InMemoryContext::new()),
        LegacyJointDriftRepository::new(provider),
    ))
}

#[test]
fn read_path_maps_entries_to_dtos() {
    let dir = tempfile::tempdir().unwrap();
    let path = create_legacy_store(dir.path(), &standard_rows());
    let mut provider = LegacyConnectionProvider::new();
    provider.open(&path).unwrap();
    let service = service_for(&provider);
    let cancel = CancellationToken::new();

    let mut names = service.get_unique_case_names(&cancel).unwrap();
    names.sort();
    assert_eq!(names, vec!["ELF X".to_string(), "RSA".to_string()]);

    let entries = service.get_entries_by_case("RSA", &cancel).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].label, "J-12");
    assert_eq!(entries[0].output_case, "RSA");

    assert!(service
        .get_entries_by_case("UNKNOWN", &cancel)
        .unwrap()
        .is_empty());
}

#[test]
fn required_lookups_translate_absence_to_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = create_legacy_store(dir.path(), &standard_rows());
    let mut provider = LegacyConnectionProvider::new();
    provider.open(&path).unwrap();
    let service = service_for(&provider);
    let cancel = CancellationToken::new();

    let err = service
        .require_entries_by_case("UNKNOWN", &cancel)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound(NotFoundError::OutputCase(ref case)) if case == "UNKNOWN"
    ));

    let by_label = service.find_entries_by_label("ELF X", "7", &cancel).unwrap();
    assert_eq!(by_label.len(), 2);

    let err = service
        .find_entries_by_label("ELF X", "J-12", &cancel)
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(NotFoundError::Label { .. })));
}

#[test]
fn import_case_copies_rows_into_aggregate() {
    let dir = tempfile::tempdir().unwrap();
    let path = create_legacy_store(dir.path(), &standard_rows());
    let mut provider = LegacyConnectionProvider::new();
    provider.open(&path).unwrap();
    let mut service = service_for(&provider);
    let cancel = CancellationToken::new();

    assert_eq!(service.import_case("ELF X", &cancel).unwrap(), 3);

    let items = service.get_all_items().unwrap();
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|item| item.output_case == "ELF X"));
    assert_eq!(service.repository().writer().context().save_count(), 1);
}

#[test]
fn import_case_with_invalid_row_imports_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let rows = vec![
        LegacyRow::new("L1", "7", "ELF X", 0.0),
        LegacyRow {
            story: None,
            label: "8",
            output_case: "ELF X",
            step_number: Some(1.0),
            drift_x: None,
        },
    ];
    let path = create_legacy_store(dir.path(), &rows);
    let mut provider = LegacyConnectionProvider::new();
    provider.open(&path).unwrap();
    let mut service = service_for(&provider);

    let err = service
        .import_case("ELF X", &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(service.get_all_items().unwrap().is_empty());
}

#[test]
fn repository_errors_propagate_in_kind() {
    let provider = LegacyConnectionProvider::new();
    let service = service_for(&provider);

    let err = service
        .get_unique_case_names(&CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, RepoError::Import(ImportError::Connection(_))));
}

#[test]
fn write_path_accepts_dtos_and_serializes_camel_case() {
    let provider = LegacyConnectionProvider::new();
    let mut service = service_for(&provider);

    let dto = JointDriftItemDto {
        story: "L1".to_string(),
        label: "7".to_string(),
        output_case: "ELF X".to_string(),
        step_number: 0.0,
        drift_x: 0.0042,
        ..JointDriftItemDto::default()
    };
    service.add_item(dto.clone()).unwrap();
    service
        .add_items(vec![JointDriftItemDto {
            label: "8".to_string(),
            ..dto.clone()
        }])
        .unwrap();

    let items = service.get_all_items().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0], dto);

    let json = serde_json::to_value(&items[0]).unwrap();
    assert_eq!(json["outputCase"], "ELF X");
    assert_eq!(json["stepNumber"], 0.0);
    assert_eq!(json["driftX"], 0.0042);
    assert!(json.get("output_case").is_none());
}

#[test]
fn reset_starts_an_empty_aggregate() {
    let provider = LegacyConnectionProvider::new();
    let mut service = service_for(&provider);
    service
        .add_item(JointDriftItemDto {
            story: "L1".to_string(),
            label: "7".to_string(),
            output_case: "RSA".to_string(),
            ..JointDriftItemDto::default()
        })
        .unwrap();

    service.reset().unwrap();
    assert!(service.get_all_items().unwrap().is_empty());
}

#[test]
fn import_case_with_nan_cell_fails_before_any_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = create_legacy_store(dir.path(), &standard_rows());
    set_text_cell(&path, "Disp Y", "NaN");
    let mut provider = LegacyConnectionProvider::new();
    provider.open(&path).unwrap();

    let mut context = SqliteContext::open_in_memory().unwrap();
    context.ensure_list().unwrap();
    let mut service = JointDriftService::new(CombinedJointDriftRepository::new(
        AggregateJointDriftRepository::new(context),
        LegacyJointDriftRepository::new(&provider),
    ));

    let err = service
        .import_case("ELF X", &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, RepoError::Import(ImportError::Decode { .. })));
    assert!(service.get_all_items().unwrap().is_empty());
}

#[test]
fn non_finite_dto_is_rejected_by_validation() {
    let provider = LegacyConnectionProvider::new();
    let mut service = service_for(&provider);

    let err = service
        .add_item(JointDriftItemDto {
            story: "L1".to_string(),
            label: "7".to_string(),
            output_case: "ELF X".to_string(),
            disp_y: f64::NAN,
            ..JointDriftItemDto::default()
        })
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(service.get_all_items().unwrap().is_empty());
}
