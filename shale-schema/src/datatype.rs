//! XSD datatype vocabulary.
//!
//! The handful of datatype IRIs the dispatch classifier understands. This
//! is not an ontology: unknown datatypes are allowed everywhere and simply
//! classify as string-kinded.

use shale_core::LiteralKind;

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
pub const XSD_INT: &str = "http://www.w3.org/2001/XMLSchema#int";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
pub const XSD_DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
pub const XSD_DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";

/// Classify a datatype IRI into a literal kind. Unknown datatypes are
/// treated as strings.
pub fn literal_kind_of(datatype: &str) -> LiteralKind {
    match datatype {
        XSD_BOOLEAN => LiteralKind::Boolean,
        XSD_INTEGER | XSD_LONG | XSD_INT | XSD_DECIMAL | XSD_DOUBLE | XSD_FLOAT => {
            LiteralKind::Number
        }
        XSD_DATE | XSD_DATE_TIME => LiteralKind::DateTime,
        _ => LiteralKind::String,
    }
}

/// True for the date-valued datatypes, whose JSON representation is an
/// RFC 3339 string that the conversion layer must parse.
pub fn is_date_datatype(datatype: &str) -> bool {
    matches!(datatype, XSD_DATE | XSD_DATE_TIME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_datatypes() {
        assert_eq!(literal_kind_of(XSD_STRING), LiteralKind::String);
        assert_eq!(literal_kind_of(XSD_BOOLEAN), LiteralKind::Boolean);
        assert_eq!(literal_kind_of(XSD_INTEGER), LiteralKind::Number);
        assert_eq!(literal_kind_of(XSD_DOUBLE), LiteralKind::Number);
        assert_eq!(literal_kind_of(XSD_DATE_TIME), LiteralKind::DateTime);
    }

    #[test]
    fn unknown_datatype_defaults_to_string() {
        assert_eq!(
            literal_kind_of("http://example.org/customType"),
            LiteralKind::String
        );
    }
}
