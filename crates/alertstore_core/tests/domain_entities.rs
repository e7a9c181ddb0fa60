mod common;

use alertstore_core::{
    field_map, open_db_in_memory, AlertConfig, AlertConfigInput, AlertService, ConfiguredFilter,
    ConfiguredFilterInput, CrudRepository, District, DistrictInput, Evaluator, FieldValue,
    FilterKind, ListQuery, RepoError, SqliteUnitOfWork, State, StateInput, ValidationError,
};
use common::row_count;

fn session() -> SqliteUnitOfWork {
    SqliteUnitOfWork::new(open_db_in_memory().unwrap()).unwrap()
}

#[test]
fn district_links_to_existing_state() {
    let mut uow = session();
    let state = CrudRepository::<State>::new()
        .create(&mut uow, &StateInput::new("Karnataka", 16))
        .unwrap();

    let district = CrudRepository::<District>::new()
        .create(
            &mut uow,
            &DistrictInput::new("Bangalore Urban", 265).state_id(Some(state.id)),
        )
        .unwrap();

    assert_eq!(district.state_id, Some(state.id));
    assert_eq!(district.external_id, 265);
}

#[test]
fn district_with_unknown_state_is_an_integrity_error() {
    let mut uow = session();
    let districts = CrudRepository::<District>::new();

    let err = districts
        .create_multi(
            &mut uow,
            &[
                DistrictInput::new("Orphan", 1),
                DistrictInput::new("Dangling", 2).state_id(Some(4_242)),
            ],
        )
        .unwrap_err();

    assert!(matches!(err, RepoError::Integrity(_)));
    assert!(err.is_write_discarded());
    assert_eq!(row_count(uow.connection(), "district"), 0);
}

#[test]
fn removing_referenced_state_is_rejected() {
    let mut uow = session();
    let states = CrudRepository::<State>::new();
    let state = states.create(&mut uow, &StateInput::new("Goa", 30)).unwrap();
    CrudRepository::<District>::new()
        .create(
            &mut uow,
            &DistrictInput::new("North Goa", 151).state_id(Some(state.id)),
        )
        .unwrap();

    let err = states.remove_with_id(&mut uow, state.id).unwrap_err();

    assert!(matches!(err, RepoError::Integrity(_)));
    assert!(states.get_by_id(&uow, state.id).unwrap().is_some());
}

#[test]
fn enum_fields_filter_by_variant_identity() {
    let mut uow = session();
    let filters = CrudRepository::<ConfiguredFilter>::new();
    filters
        .create_multi(
            &mut uow,
            &[
                ConfiguredFilterInput::new(FilterKind::Age, Evaluator::GreaterThan, "45"),
                ConfiguredFilterInput::new(FilterKind::Vaccine, Evaluator::Equals, "COVISHIELD"),
                ConfiguredFilterInput::new(FilterKind::Dose, Evaluator::In, "1,2"),
            ],
        )
        .unwrap();

    let greater = filters
        .get_multi(
            &uow,
            &ListQuery::filtered(field_map([("evaluator", Evaluator::GreaterThan)])),
        )
        .unwrap();
    assert_eq!(greater.len(), 1);
    assert_eq!(greater[0].filter, FilterKind::Age);
    assert_eq!(greater[0].value, "45");

    let by_symbol = filters
        .get(&uow, &field_map([("evaluator", ">")]))
        .unwrap_err();
    assert!(matches!(
        by_symbol,
        RepoError::Validation(ValidationError::TypeMismatch { expected: "enum", .. })
    ));

    let unknown_variant = filters
        .get(&uow, &field_map([("filter", FieldValue::Enum("Pincode"))]))
        .unwrap_err();
    assert!(matches!(unknown_variant, RepoError::Validation(_)));
}

#[test]
fn configured_filter_update_switches_evaluator() {
    let mut uow = session();
    let filters = CrudRepository::<ConfiguredFilter>::new();
    let created = filters
        .create(
            &mut uow,
            &ConfiguredFilterInput::new(FilterKind::Age, Evaluator::LessThan, "18"),
        )
        .unwrap();

    let updated = filters
        .update(
            &mut uow,
            created,
            &ConfiguredFilterInput::default().evaluator(Evaluator::Equals),
        )
        .unwrap();

    assert_eq!(updated.evaluator, Evaluator::Equals);
    assert_eq!(updated.filter, FilterKind::Age);
    assert_eq!(updated.value, "18");
}

#[test]
fn alert_config_description_is_partially_updatable() {
    let mut uow = session();
    let configs = CrudRepository::<AlertConfig>::new();
    let created = configs
        .create(&mut uow, &AlertConfigInput::new("chat-1", "Morning slots"))
        .unwrap();
    assert_eq!(created.description, None);

    let described = configs
        .update(
            &mut uow,
            created,
            &AlertConfigInput::default().description(Some("18+ only".to_string())),
        )
        .unwrap();
    assert_eq!(described.chat_id, "chat-1");
    assert_eq!(described.name, "Morning slots");
    assert_eq!(described.description.as_deref(), Some("18+ only"));

    let cleared = configs
        .update(
            &mut uow,
            described,
            &field_map([("description", FieldValue::Null)]),
        )
        .unwrap();
    assert_eq!(cleared.description, None);
}

#[test]
fn subscribe_creates_config_with_bound_filters() {
    let mut uow = session();
    let service = AlertService::new();

    let config = service
        .subscribe(
            &mut uow,
            &AlertConfigInput::new("chat-7", "Pune 45+"),
            &[
                ConfiguredFilterInput::new(FilterKind::Age, Evaluator::GreaterThan, "45"),
                ConfiguredFilterInput::new(FilterKind::Dose, Evaluator::Equals, "2"),
            ],
        )
        .unwrap();

    let filters = service.filters_for(&uow, config.id).unwrap();
    assert_eq!(filters.len(), 2);
    assert!(filters
        .iter()
        .all(|filter| filter.alert_config_id == Some(config.id)));

    let subscriptions = service.subscriptions_for_chat(&uow, "chat-7").unwrap();
    assert_eq!(subscriptions, vec![config]);
}

#[test]
fn subscribe_with_invalid_filter_leaves_nothing_behind() {
    let mut uow = session();
    let service = AlertService::new();

    let err = service
        .subscribe(
            &mut uow,
            &AlertConfigInput::new("chat-8", "Broken"),
            &[
                ConfiguredFilterInput::new(FilterKind::Age, Evaluator::GreaterThan, "45"),
                ConfiguredFilterInput::new(FilterKind::Vaccine, Evaluator::Equals, " "),
            ],
        )
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::InvalidValue { field: "value", .. })
    ));
    assert_eq!(row_count(uow.connection(), "alert_config"), 0);
    assert_eq!(row_count(uow.connection(), "configured_filter"), 0);
}

#[test]
fn unsubscribe_removes_filters_then_config() {
    let mut uow = session();
    let service = AlertService::new();
    let config = service
        .subscribe(
            &mut uow,
            &AlertConfigInput::new("chat-9", "Any vaccine"),
            &[ConfiguredFilterInput::new(
                FilterKind::Vaccine,
                Evaluator::In,
                "COVAXIN,COVISHIELD",
            )],
        )
        .unwrap();

    let removed = service.unsubscribe(&mut uow, config.id).unwrap();

    assert_eq!(removed, config);
    assert_eq!(row_count(uow.connection(), "alert_config"), 0);
    assert_eq!(row_count(uow.connection(), "configured_filter"), 0);

    let again = service.unsubscribe(&mut uow, config.id).unwrap_err();
    assert!(matches!(again, RepoError::MissingTarget { entity: "AlertConfig", .. }));
}
