use docrepo::errors::ErrorKind;
use docrepo::repository::{resolve_collection_name, CollectionName, Entity, TypedRepository};
use docrepo_derive::Entity;
use docrepo_int_test::test_util::{cleanup, create_test_context, run_test};
use serde::{Deserialize, Serialize};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[derive(Serialize, Deserialize, Entity, Debug, Clone, PartialEq)]
#[entity(collection = "widgets")]
pub struct Widget {
    id: String,
}

#[derive(Serialize, Deserialize, Entity, Debug, Clone, PartialEq)]
pub struct Gadget {
    id: String,
}

#[derive(Serialize, Deserialize, Entity, Debug, Clone, PartialEq)]
#[entity(name = "legacy_things")]
pub struct Thing {
    id: i64,
}

#[derive(Serialize, Deserialize, Entity, Debug, Clone, PartialEq)]
#[entity(id(field = "code"))]
pub struct Coupon {
    #[serde(rename = "_code")]
    code: String,
    percent: u8,
}

#[derive(Serialize, Deserialize, Entity, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
#[entity(collection = "user_profiles", id(field = "user_id"))]
pub struct UserProfile {
    user_id: String,
    display_name: String,
}

#[derive(Serialize, Deserialize, Entity, Debug, Clone, PartialEq)]
#[entity(id(field = "number"))]
pub struct Ticket {
    #[serde(rename(serialize = "ticketNo", deserialize = "ticketNo"))]
    number: u32,
    seat: String,
}

#[derive(Serialize, Deserialize, Entity, Debug, Clone, PartialEq)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "PascalCase"))]
#[entity(id(field = "batch_id"))]
pub struct Shipment {
    batch_id: String,
    weight: u32,
}

#[derive(Serialize, Deserialize, Entity, Debug, Clone, PartialEq)]
pub struct Envelope<V> {
    id: String,
    payload: V,
}

#[test]
fn test_marker_wins_over_type_name() {
    assert_eq!(resolve_collection_name::<Widget>(), "widgets");
    assert_eq!(resolve_collection_name::<Thing>(), "legacy_things");
    assert_eq!(resolve_collection_name::<UserProfile>(), "user_profiles");
}

#[test]
fn test_type_name_without_marker() {
    assert_eq!(resolve_collection_name::<Gadget>(), "Gadget");
    assert_eq!(resolve_collection_name::<Coupon>(), "Coupon");
    assert_eq!(resolve_collection_name::<Envelope<u32>>(), "Envelope");
}

#[test]
fn test_blank_collection_name_is_invalid() {
    let err = CollectionName::new("").err().map(|e| e.kind().clone());
    assert_eq!(err, Some(ErrorKind::InvalidConfiguration));
    let err = CollectionName::new(" \t ").err().map(|e| e.kind().clone());
    assert_eq!(err, Some(ErrorKind::InvalidConfiguration));
}

#[test]
fn test_id_field_follows_serde_names() {
    assert_eq!(Widget::id_field(), "id");
    assert_eq!(Coupon::id_field(), "_code");
    assert_eq!(UserProfile::id_field(), "userId");
    assert_eq!(Coupon::entity_name(), "Coupon");
    assert_eq!(Ticket::id_field(), "ticketNo");
    assert_eq!(Shipment::id_field(), "BatchId");
}

#[test]
fn test_directional_renames_round_trip() {
    run_test(
        create_test_context,
        |ctx| {
            let tickets: TypedRepository<Ticket> = ctx.registry().instance_for()?;
            let ticket = Ticket {
                number: 12,
                seat: "4A".into(),
            };
            tickets.add(ticket.clone())?;
            tickets.update(Ticket {
                seat: "9C".into(),
                ..ticket.clone()
            })?;
            assert_eq!(tickets.find_by_id(&12)?.map(|t| t.seat), Some("9C".to_string()));
            tickets.delete(&ticket)?;
            assert!(tickets.get_all()?.is_empty());

            let shipments: TypedRepository<Shipment> = ctx.registry().instance_for()?;
            let shipment = Shipment {
                batch_id: "b-1".into(),
                weight: 3,
            };
            shipments.add(shipment.clone())?;
            shipments.delete_by_id(&shipment.batch_id)?;
            assert!(shipments.get_all()?.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_renamed_id_round_trip() {
    run_test(
        create_test_context,
        |ctx| {
            let coupons: TypedRepository<Coupon> = ctx.registry().instance_for()?;
            let spring = Coupon {
                code: "SPRING".into(),
                percent: 10,
            };
            coupons.add(spring.clone())?;
            assert_eq!(coupons.find_by_id(&"SPRING".to_string())?, Some(spring.clone()));

            coupons.update(Coupon {
                percent: 15,
                ..spring.clone()
            })?;
            assert_eq!(coupons.get_all()?[0].percent, 15);

            coupons.delete(&spring)?;
            assert!(coupons.get_all()?.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_camel_case_entity_round_trip() {
    run_test(
        create_test_context,
        |ctx| {
            let profiles: TypedRepository<UserProfile> = ctx.registry().instance_for()?;
            assert_eq!(profiles.collection_name(), "user_profiles");

            let profile = UserProfile {
                user_id: "u1".into(),
                display_name: "Ada".into(),
            };
            profiles.add(profile.clone())?;
            profiles.update(UserProfile {
                display_name: "Ada L.".into(),
                ..profile.clone()
            })?;
            let stored = profiles.find_by_id(&"u1".to_string())?;
            assert_eq!(stored.map(|p| p.display_name), Some("Ada L.".to_string()));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_generic_entities_share_a_collection() {
    run_test(
        create_test_context,
        |ctx| {
            let registry = ctx.registry();
            let numbers: TypedRepository<Envelope<u32>> = registry.instance_for()?;
            let texts: TypedRepository<Envelope<String>> = registry.instance_for()?;

            // distinct instances, same physical collection
            assert_eq!(numbers.collection_name(), "Envelope");
            assert_eq!(texts.collection_name(), "Envelope");
            assert!(registry.contains::<Envelope<u32>>());
            assert!(registry.contains::<Envelope<String>>());
            Ok(())
        },
        cleanup,
    )
}
