//! Shared schema fixtures for this crate's tests.

use shale_schema::datatype::{XSD_DATE_TIME, XSD_INTEGER, XSD_STRING};
use shale_schema::{NodeShapeConfig, PropertyShapeConfig, ShapeId, ShapeRegistry};

/// A Person/Organization schema with the property spread the compilers
/// care about: single and multi literals, dates, and single and multi
/// object properties.
pub(crate) fn person_schema() -> (ShapeRegistry, ShapeId, ShapeId) {
    let registry = ShapeRegistry::new();
    let person = registry
        .register(NodeShapeConfig::new("Person").target_class("http://schema.org/Person"))
        .unwrap();
    let org = registry
        .register(NodeShapeConfig::new("Organization").target_class("http://schema.org/Organization"))
        .unwrap();

    registry
        .register_property(
            person,
            "name",
            PropertyShapeConfig::new("http://schema.org/name")
                .datatype(XSD_STRING)
                .min_count(1)
                .max_count(1),
        )
        .unwrap();
    registry
        .register_property(
            person,
            "age",
            PropertyShapeConfig::new("http://schema.org/age")
                .datatype(XSD_INTEGER)
                .max_count(1),
        )
        .unwrap();
    registry
        .register_property(
            person,
            "hobby",
            PropertyShapeConfig::new("http://example.org/hobby")
                .datatype(XSD_STRING)
                .max_count(1),
        )
        .unwrap();
    registry
        .register_property(
            person,
            "born",
            PropertyShapeConfig::new("http://schema.org/birthDate")
                .datatype(XSD_DATE_TIME)
                .max_count(1),
        )
        .unwrap();
    registry
        .register_property(
            person,
            "nicknames",
            PropertyShapeConfig::new("http://example.org/nickname").datatype(XSD_STRING),
        )
        .unwrap();
    registry
        .register_property(
            person,
            "bestFriend",
            PropertyShapeConfig::new("http://example.org/bestFriend")
                .value_shape(person)
                .max_count(1),
        )
        .unwrap();
    registry
        .register_property(
            person,
            "friends",
            PropertyShapeConfig::new("http://schema.org/knows").value_shape(person),
        )
        .unwrap();
    registry
        .register_property(
            person,
            "employer",
            PropertyShapeConfig::new("http://schema.org/worksFor")
                .value_shape(org)
                .max_count(1),
        )
        .unwrap();

    registry
        .register_property(
            org,
            "name",
            PropertyShapeConfig::new("http://schema.org/name")
                .datatype(XSD_STRING)
                .max_count(1),
        )
        .unwrap();
    registry
        .register_property(
            org,
            "members",
            PropertyShapeConfig::new("http://schema.org/member").value_shape(person),
        )
        .unwrap();

    (registry, person, org)
}
