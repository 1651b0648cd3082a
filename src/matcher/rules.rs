//! Constraint matching, merging and attribute checks

use crate::constraint::{ConfigError, ConfigResult, Constraint};
use crate::votable::{
    Arraysize, Declared, DeclaredField, DeclaredParam, FieldDatatype, FieldKey, Precision,
    ARRAYSIZE_PATTERN, PRECISION_PATTERN,
};

/// Returns true if `constraint` applies to `element`.
///
/// - A constraint without identifying keys applies to everything.
/// - A constraint with required identifying keys applies only when all of
///   them equal the element's attributes.
/// - Otherwise it applies when any of its identifying keys matches.
pub fn applies_to(constraint: &Constraint, element: &dyn Declared) -> bool {
    let identifying = FieldKey::ALL.iter().filter(|key| key.is_identifying());

    if identifying.clone().all(|key| constraint.value(*key).is_none()) {
        return true;
    }

    if constraint.requires_match() {
        identifying
            .filter(|key| key.is_required())
            .filter_map(|key| constraint.value(*key).map(|v| (*key, v)))
            .all(|(key, expected)| element.attribute(key).as_deref() == Some(expected.as_str()))
    } else {
        identifying
            .filter(|key| !key.is_required())
            .filter_map(|key| constraint.value(*key).map(|v| (*key, v)))
            .any(|(key, expected)| attribute_equals(element, key, &expected))
    }
}

fn attribute_equals(element: &dyn Declared, key: FieldKey, expected: &str) -> bool {
    match (key, element.attribute(key)) {
        (FieldKey::Datatype, Some(actual)) => actual.eq_ignore_ascii_case(expected),
        (_, Some(actual)) => actual == expected,
        (_, None) => false,
    }
}

/// Merges every constraint in `constraints` that applies to `element`.
///
/// Limits tighten: the smaller arraysize, the smaller width and the less
/// precise precision win. Any other attribute must agree across all applicable
/// constraints, or the catalog is unusable for this element.
pub fn merged_constraint(
    constraints: &[Constraint],
    element: &dyn Declared,
) -> ConfigResult<Constraint> {
    let mut merged = Constraint::default();
    let mut matched_any = false;

    for constraint in constraints.iter().filter(|c| applies_to(c, element)) {
        if matched_any {
            merged = merge(merged, constraint, element)?;
        } else {
            merged = constraint.clone();
            matched_any = true;
        }
    }
    Ok(merged)
}

fn merge(into: Constraint, from: &Constraint, element: &dyn Declared) -> ConfigResult<Constraint> {
    let conflict = |key: FieldKey| {
        ConfigError::conflicting(element.kind().as_str(), element.name(), key.as_str())
    };

    let agree = |key: FieldKey, a: Option<String>, b: &Option<String>| match (a, b) {
        (Some(a), Some(b)) if a != *b => Err(conflict(key)),
        (Some(a), _) => Ok(Some(a)),
        (None, b) => Ok(b.clone()),
    };

    let max_precision = match (into.max_precision, from.max_precision) {
        (Some(a), Some(b)) => match b.is_more_precise_than(&a) {
            None => return Err(conflict(FieldKey::Precision)),
            Some(true) => Some(a),
            Some(false) => Some(b),
        },
        (a, b) => a.or(b),
    };

    Ok(Constraint {
        name: agree(FieldKey::Name, into.name, &from.name)?,
        id: agree(FieldKey::Id, into.id, &from.id)?,
        ucd: agree(FieldKey::Ucd, into.ucd, &from.ucd)?,
        datatype: agree(FieldKey::Datatype, into.datatype, &from.datatype)?,
        unit: agree(FieldKey::Unit, into.unit, &from.unit)?,
        reference: agree(FieldKey::Ref, into.reference, &from.reference)?,
        max_arraysize: match (into.max_arraysize, from.max_arraysize) {
            (Some(a), Some(b)) => Some(a.tighten(b)),
            (a, b) => a.or(b),
        },
        max_width: match (into.max_width, from.max_width) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        },
        max_precision,
        optional: into.optional && from.optional,
    })
}

/// Finds the PARAM a constraint applies to
pub fn match_param<'a>(
    params: &'a [DeclaredParam],
    constraint: &Constraint,
) -> Option<&'a DeclaredParam> {
    params.iter().find(|p| applies_to(constraint, *p))
}

/// Finds the FIELD a constraint applies to
pub fn match_field<'a>(
    fields: &'a [DeclaredField],
    constraint: &Constraint,
) -> Option<&'a DeclaredField> {
    fields.iter().find(|f| applies_to(constraint, *f))
}

/// Resolves the `datatype` attribute of an element
pub fn resolve_datatype(element: &dyn Declared) -> Result<FieldDatatype, String> {
    let raw = element.attribute(FieldKey::Datatype).unwrap_or_default();
    FieldDatatype::parse(&raw).ok_or_else(|| format!("Datatype '{}' is not supported", raw))
}

/// Checks an element's attributes against its merged constraint.
///
/// Returns the first violation.
pub fn check_attributes(constraint: &Constraint, element: &dyn Declared) -> Result<(), String> {
    for key in FieldKey::ALL {
        let Some(expected) = constraint.value(key) else {
            continue;
        };
        let actual = element.attribute(key);

        match key {
            FieldKey::Arraysize => check_arraysize_limit(constraint, actual)?,
            FieldKey::Width => check_width_limit(constraint, actual)?,
            FieldKey::Precision => check_precision_limit(constraint, actual)?,
            _ => match actual {
                None => {
                    return Err(format!(
                        "Attribute '{}' is required and must be '{}'",
                        key, expected
                    ))
                }
                Some(actual) if !attribute_equals(element, key, &expected) => {
                    return Err(format!(
                        "Attribute '{}' ('{}') must be '{}'",
                        key, actual, expected
                    ))
                }
                Some(_) => {}
            },
        }
    }
    Ok(())
}

fn check_arraysize_limit(constraint: &Constraint, actual: Option<String>) -> Result<(), String> {
    let (Some(limit), Some(actual)) = (constraint.max_arraysize, actual) else {
        return Ok(());
    };
    // Malformed declarations are reported by check_declared
    let Ok(declared) = actual.parse::<Arraysize>() else {
        return Ok(());
    };
    if declared.exceeds(&limit) {
        let maximum = limit.maximum().map(|m| m.to_string()).unwrap_or_default();
        return Err(format!(
            "Attribute 'arraysize' ('{}') exceeds maximum of '{}'",
            actual, maximum
        ));
    }
    Ok(())
}

fn check_width_limit(constraint: &Constraint, actual: Option<String>) -> Result<(), String> {
    let (Some(limit), Some(actual)) = (constraint.max_width, actual) else {
        return Ok(());
    };
    match actual.parse::<u32>() {
        Ok(width) if width > limit => Err(format!(
            "Attribute 'width' ('{}') is greater than maximum of '{}'",
            actual, limit
        )),
        _ => Ok(()),
    }
}

fn check_precision_limit(constraint: &Constraint, actual: Option<String>) -> Result<(), String> {
    let (Some(limit), Some(actual)) = (constraint.max_precision, actual) else {
        return Ok(());
    };
    let Ok(declared) = actual.parse::<Precision>() else {
        return Ok(());
    };
    match declared.is_more_precise_than(&limit) {
        None => Err(format!(
            "Attribute 'precision' ('{}') must specify a number of {}",
            actual,
            limit.kind_description()
        )),
        Some(true) => Err(format!(
            "Attribute 'precision' ('{}') is more precise than maximum {}",
            actual,
            limit.description()
        )),
        Some(false) => Ok(()),
    }
}

/// Checks the syntax of size attributes for the element's datatype
pub fn check_declared(datatype: FieldDatatype, element: &dyn Declared) -> Result<(), String> {
    if let Some(arraysize) = element.attribute(FieldKey::Arraysize) {
        if !datatype.accepts_arraysize() {
            return Err(format!(
                "Attribute 'arraysize' ('{}') for datatype '{}' is not supported",
                arraysize,
                datatype.type_name()
            ));
        }
        if arraysize.parse::<Arraysize>().is_err() {
            return Err(format!(
                "Attribute 'arraysize' ('{}') does not match '{}'",
                arraysize, ARRAYSIZE_PATTERN
            ));
        }
    }
    if let Some(precision) = element.attribute(FieldKey::Precision) {
        if precision.parse::<Precision>().is_err() {
            return Err(format!(
                "Attribute 'precision' does not match '{}'",
                PRECISION_PATTERN
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConfigErrorCode;

    fn ra_field() -> DeclaredField {
        DeclaredField::new("ra_deg_cont", "double").with_ucd("pos.eq.ra;meta.main")
    }

    #[test]
    fn test_unidentified_constraint_applies_to_all() {
        assert!(applies_to(&Constraint::default(), &ra_field()));
        assert!(applies_to(&Constraint::default().max_width(4), &ra_field()));
    }

    #[test]
    fn test_required_keys_must_all_match() {
        let by_ucd = Constraint::with_ucd("pos.eq.ra;meta.main");
        assert!(applies_to(&by_ucd, &ra_field()));

        let mut by_both = by_ucd.clone();
        by_both.name = Some("other".into());
        assert!(!applies_to(&by_both, &ra_field()));
    }

    #[test]
    fn test_datatype_catch_all() {
        let chars = Constraint::for_datatype("char");
        assert!(applies_to(&chars, &DeclaredField::new("comment", "char")));
        assert!(applies_to(&chars, &DeclaredField::new("comment", "CHAR")));
        assert!(!applies_to(&chars, &ra_field()));
    }

    #[test]
    fn test_match_param_by_name() {
        let params = vec![
            DeclaredParam::text("Indexed Fields", "ra"),
            DeclaredParam::text("Catalogue Name", "abc"),
        ];
        let found = match_param(&params, &Constraint::named("Catalogue Name")).unwrap();
        assert_eq!(found.value, "abc");
        assert!(match_param(&params, &Constraint::named("Principal Fields")).is_none());
    }

    #[test]
    fn test_match_field_by_ucd() {
        let fields = vec![DeclaredField::new("name", "char"), ra_field()];
        let found = match_field(&fields, &Constraint::with_ucd("pos.eq.ra;meta.main")).unwrap();
        assert_eq!(found.name, "ra_deg_cont");
    }

    #[test]
    fn test_merge_tightens_limits() {
        let field = DeclaredField::new("source", "char").with_ucd("meta.id;meta.main");
        let constraints = vec![
            Constraint::with_ucd("meta.id;meta.main").max_arraysize(Arraysize::fixed(64)),
            Constraint::for_datatype("char").max_arraysize(Arraysize::fixed(1024)),
            Constraint::default().max_width(10),
            Constraint::default().max_width(8),
        ];
        let merged = merged_constraint(&constraints, &field).unwrap();
        assert_eq!(merged.max_arraysize, Some(Arraysize::fixed(64)));
        assert_eq!(merged.max_width, Some(8));
        assert_eq!(merged.ucd.as_deref(), Some("meta.id;meta.main"));
        assert_eq!(merged.datatype.as_deref(), Some("char"));
    }

    #[test]
    fn test_merge_precision_keeps_less_precise() {
        let constraints = vec![
            Constraint::default().max_precision(Precision::DecimalPlaces(6)),
            Constraint::default().max_precision(Precision::DecimalPlaces(3)),
        ];
        let merged = merged_constraint(&constraints, &ra_field()).unwrap();
        assert_eq!(merged.max_precision, Some(Precision::DecimalPlaces(3)));
    }

    #[test]
    fn test_merge_conflicts_are_config_errors() {
        let mut a = Constraint::with_ucd("pos.eq.ra;meta.main");
        a.unit = Some("deg".into());
        let mut b = Constraint::default();
        b.unit = Some("rad".into());

        let err = merged_constraint(&[a, b], &ra_field()).unwrap_err();
        assert_eq!(err.code(), ConfigErrorCode::ConstraintsConflicting);
        assert!(err.message().contains("FIELD 'ra_deg_cont'"));

        let err = merged_constraint(
            &[
                Constraint::default().max_precision(Precision::DecimalPlaces(2)),
                Constraint::default().max_precision(Precision::SignificantDigits(2)),
            ],
            &ra_field(),
        )
        .unwrap_err();
        assert!(err.message().contains("precision"));
    }

    #[test]
    fn test_check_attributes_messages() {
        let mut constraint = Constraint::with_ucd("pos.eq.ra;meta.main");
        constraint.unit = Some("deg".into());

        assert_eq!(
            check_attributes(&constraint, &ra_field()).unwrap_err(),
            "Attribute 'unit' is required and must be 'deg'"
        );
        assert_eq!(
            check_attributes(&constraint, &ra_field().with_unit("rad")).unwrap_err(),
            "Attribute 'unit' ('rad') must be 'deg'"
        );
        assert!(check_attributes(&constraint, &ra_field().with_unit("deg")).is_ok());
    }

    #[test]
    fn test_check_attribute_limits() {
        let constraint = Constraint::for_datatype("char").max_arraysize(Arraysize::fixed(1024));
        let wide = DeclaredField::new("c", "char").with_arraysize("1025");
        assert_eq!(
            check_attributes(&constraint, &wide).unwrap_err(),
            "Attribute 'arraysize' ('1025') exceeds maximum of '1024'"
        );
        assert!(check_attributes(&constraint, &DeclaredField::new("c", "char").with_arraysize("*")).is_ok());

        let constraint = Constraint::default().max_width(5);
        assert_eq!(
            check_attributes(&constraint, &ra_field().with_width(6)).unwrap_err(),
            "Attribute 'width' ('6') is greater than maximum of '5'"
        );

        let constraint = Constraint::default().max_precision(Precision::DecimalPlaces(3));
        assert_eq!(
            check_attributes(&constraint, &ra_field().with_precision("5")).unwrap_err(),
            "Attribute 'precision' ('5') is more precise than maximum 3 decimal places"
        );
        assert_eq!(
            check_attributes(&constraint, &ra_field().with_precision("E5")).unwrap_err(),
            "Attribute 'precision' ('E5') must specify a number of decimal places"
        );
    }

    #[test]
    fn test_check_declared() {
        let field = DeclaredField::new("n", "int").with_arraysize("4");
        assert_eq!(
            check_declared(FieldDatatype::Int, &field).unwrap_err(),
            "Attribute 'arraysize' ('4') for datatype 'int' is not supported"
        );

        let field = DeclaredField::new("n", "char").with_arraysize("x4");
        assert!(check_declared(FieldDatatype::Char, &field)
            .unwrap_err()
            .starts_with("Attribute 'arraysize' ('x4') does not match"));

        let field = DeclaredField::new("n", "double").with_precision("Q");
        assert!(check_declared(FieldDatatype::Double, &field).is_err());
    }

    #[test]
    fn test_resolve_datatype() {
        assert_eq!(resolve_datatype(&ra_field()), Ok(FieldDatatype::Double));
        assert_eq!(
            resolve_datatype(&DeclaredField::new("x", "floatComplex")),
            Err("Datatype 'floatComplex' is not supported".to_string())
        );
    }
}
