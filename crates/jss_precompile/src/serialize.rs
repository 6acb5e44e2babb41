use crate::classify::{format_number, StaticValue};

/// A static value with no text form. The property is left to the runtime instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Value can not be serialized: lists may only be nested one level deep")]
pub struct SerializationOverflow;

/// Text form of a property value.
///
/// Lists are joined with `", "`. A list directly inside a list is joined with a single space,
/// so `[[0, 1], 'solid']` becomes `0 1, solid`. Anything nested deeper has no text form.
pub fn serialize_value(value: &StaticValue) -> Result<String, SerializationOverflow> {
  match value {
    StaticValue::List(items) => {
      let parts = items
        .iter()
        .map(|item| match item {
          StaticValue::List(inner) => inner
            .iter()
            .map(serialize_scalar)
            .collect::<Result<Vec<_>, _>>()
            .map(|inner| inner.join(" ")),
          scalar => serialize_scalar(scalar),
        })
        .collect::<Result<Vec<_>, _>>()?;
      Ok(parts.join(", "))
    }
    scalar => serialize_scalar(scalar),
  }
}

fn serialize_scalar(value: &StaticValue) -> Result<String, SerializationOverflow> {
  match value {
    StaticValue::Str(value) => Ok(value.clone()),
    StaticValue::Num(value) => Ok(format_number(*value)),
    StaticValue::List(_) => Err(SerializationOverflow),
  }
}

/// `name: value;`
pub fn serialize_property(name: &str, value: &StaticValue) -> Result<String, SerializationOverflow> {
  Ok(format!("{}: {};", name, serialize_value(value)?))
}

/// A rule block for `class_name`, one indented declaration per line. A rule without
/// declarations has no text at all.
pub fn serialize_rule(class_name: &str, declarations: &[String]) -> String {
  if declarations.is_empty() {
    return String::new();
  }

  let mut rule = format!(".{} {{\n", class_name);
  for declaration in declarations {
    rule.push_str("  ");
    rule.push_str(declaration);
    rule.push('\n');
  }
  rule.push('}');
  rule
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn list(items: Vec<StaticValue>) -> StaticValue {
    StaticValue::List(items)
  }

  fn num(value: f64) -> StaticValue {
    StaticValue::Num(value)
  }

  #[test]
  fn test_scalars() {
    assert_eq!(
      serialize_value(&StaticValue::Str("red".into())),
      Ok("red".to_string())
    );
    assert_eq!(serialize_value(&num(0.0)), Ok("0".to_string()));
    assert_eq!(serialize_value(&num(1.5)), Ok("1.5".to_string()));
  }

  #[test]
  fn test_lists_join_with_comma() {
    assert_eq!(
      serialize_property("x", &list(vec![num(0.0), num(1.0)])),
      Ok("x: 0, 1;".to_string())
    );
  }

  #[test]
  fn test_nested_list_joins_with_space() {
    assert_eq!(
      serialize_property("x", &list(vec![list(vec![num(0.0), num(1.0)])])),
      Ok("x: 0 1;".to_string())
    );
    assert_eq!(
      serialize_value(&list(vec![
        list(vec![num(1.0), StaticValue::Str("solid".into())]),
        StaticValue::Str("red".into()),
      ])),
      Ok("1 solid, red".to_string())
    );
  }

  #[test]
  fn test_deeper_nesting_overflows() {
    assert_eq!(
      serialize_value(&list(vec![list(vec![list(vec![num(0.0)])])])),
      Err(SerializationOverflow)
    );
  }

  #[test]
  fn test_rule() {
    assert_eq!(
      serialize_rule(
        "a-id",
        &["color: red;".to_string(), "width: 0;".to_string()]
      ),
      ".a-id {\n  color: red;\n  width: 0;\n}"
    );
    assert_eq!(serialize_rule("a-id", &[]), "");
  }
}
