//! XML placement of field values.
//!
//! | Kind | Path `a/b` | Layout |
//! |---|---|---|
//! | Scalar | `a/b` | `<a><b>value</b></a>` |
//! | Scalar | `a/@b` | `<a b="value"/>` |
//! | Collection | `a/b` | `<a><b>v1</b><b>v2</b></a>` |
//! | Collection of collections | `a/b` | `<a><b><item>v1</item></b><b/></a>` |
//!
//! The wrapper chain of a collection is created even when the collection is
//! empty. Collection items replace the existing items in place, so saving an
//! unchanged object twice yields the same tree.

use tproj_mapping::{DocumentFormat, FieldDescriptor, FieldType, MappingError, PersistenceKind, Value};

use crate::document::Element;
use crate::path::FieldPath;

/// Element name of items nested inside a collection item.
pub const INNER_ITEM: &str = "item";

/// [`DocumentFormat`] over [`Element`] nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlFormat;

impl DocumentFormat for XmlFormat {
    type Node = Element;

    fn write_field(
        &self,
        node: &mut Element,
        field: &FieldDescriptor,
        value: Option<&Value>,
    ) -> Result<(), MappingError> {
        let path = FieldPath::parse(field.path())?;
        match field.kind() {
            PersistenceKind::Scalar => write_scalar(node, &path, value),
            PersistenceKind::Collection | PersistenceKind::CollectionOfCollections => {
                if path.attribute().is_some() {
                    return Err(MappingError::invalid_path(
                        field.path(),
                        "collections cannot be stored in an attribute",
                    ));
                }
                match value {
                    Some(Value::List(items)) => write_collection(node, &path, items),
                    Some(other) => Err(MappingError::TypeMismatch {
                        expected: "list",
                        found: other.kind_name(),
                    }),
                    None => write_collection(node, &path, &[]),
                }
            }
        }
    }

    fn read_field(
        &self,
        node: &Element,
        field: &FieldDescriptor,
    ) -> Result<Option<Value>, MappingError> {
        let path = FieldPath::parse(field.path())?;
        match field.kind() {
            PersistenceKind::Scalar => read_scalar(node, &path, field.field_type()),
            PersistenceKind::Collection | PersistenceKind::CollectionOfCollections => {
                if path.attribute().is_some() {
                    return Err(MappingError::invalid_path(
                        field.path(),
                        "collections cannot be stored in an attribute",
                    ));
                }
                let element_type = field.field_type().element().ok_or(MappingError::TypeMismatch {
                    expected: "sequence",
                    found: field.field_type().kind_name(),
                })?;
                read_collection(node, &path, *element_type).map(Some)
            }
        }
    }
}

fn write_scalar(
    node: &mut Element,
    path: &FieldPath<'_>,
    value: Option<&Value>,
) -> Result<(), MappingError> {
    let text = match value {
        Some(value) => Some(value.to_text().ok_or(MappingError::TypeMismatch {
            expected: "scalar",
            found: value.kind_name(),
        })?),
        None => None,
    };

    if let Some(attribute) = path.attribute() {
        match text {
            Some(text) => node
                .ensure_descendant(path.segments())
                .set_attribute(attribute, text),
            None => {
                if let Some(target) = node.descendant_mut(path.segments()) {
                    target.remove_attribute(attribute);
                }
            }
        }
        return Ok(());
    }

    let (wrappers, name) = path
        .split_last()
        .ok_or_else(|| MappingError::invalid_path("", "scalar path names no element"))?;
    match text {
        Some(text) => {
            let parent = node.ensure_descendant(wrappers);
            match parent.child_mut(name) {
                Some(existing) => existing.set_text(Some(text)),
                None => parent.push_child(Element::with_text(name, text)),
            }
        }
        None => {
            if let Some(parent) = node.descendant_mut(wrappers) {
                parent.remove_children(name);
            }
        }
    }
    Ok(())
}

fn read_scalar(
    node: &Element,
    path: &FieldPath<'_>,
    field_type: FieldType,
) -> Result<Option<Value>, MappingError> {
    let text = match path.attribute() {
        Some(attribute) => node
            .descendant(path.segments())
            .and_then(|target| target.attribute(attribute)),
        None => path.split_last().and_then(|(wrappers, name)| {
            node.descendant(wrappers)
                .and_then(|parent| parent.child(name))
                .map(|element| element.text().unwrap_or(""))
        }),
    };
    text.map(|text| Value::parse_text(text, field_type))
        .transpose()
}

fn write_collection(
    node: &mut Element,
    path: &FieldPath<'_>,
    items: &[Value],
) -> Result<(), MappingError> {
    let (wrappers, name) = path
        .split_last()
        .ok_or_else(|| MappingError::invalid_path("", "collection path names no element"))?;
    // Build first so a bad item leaves the tree untouched.
    let elements = items
        .iter()
        .map(|item| build_item(name, item))
        .collect::<Result<Vec<_>, _>>()?;

    let container = node.ensure_descendant(wrappers);
    let insert_at = container
        .remove_children(name)
        .unwrap_or(container.children().len());
    container
        .children_mut()
        .splice(insert_at..insert_at, elements);
    Ok(())
}

fn build_item(name: &str, value: &Value) -> Result<Element, MappingError> {
    match value {
        Value::List(inner) => {
            let mut element = Element::new(name);
            for item in inner {
                element.push_child(build_item(INNER_ITEM, item)?);
            }
            Ok(element)
        }
        scalar => {
            let text = scalar.to_text().ok_or(MappingError::TypeMismatch {
                expected: "scalar",
                found: scalar.kind_name(),
            })?;
            Ok(Element::with_text(name, text))
        }
    }
}

fn read_collection(
    node: &Element,
    path: &FieldPath<'_>,
    element_type: FieldType,
) -> Result<Value, MappingError> {
    let Some((wrappers, name)) = path.split_last() else {
        return Ok(Value::List(Vec::new()));
    };
    let Some(container) = node.descendant(wrappers) else {
        return Ok(Value::List(Vec::new()));
    };
    container
        .children_named(name)
        .map(|element| read_item(element, element_type))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

fn read_item(element: &Element, field_type: FieldType) -> Result<Value, MappingError> {
    match field_type {
        FieldType::Sequence(inner) => element
            .children_named(INNER_ITEM)
            .map(|child| read_item(child, *inner))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        scalar => Value::parse_text(element.text().unwrap_or(""), scalar),
    }
}

#[cfg(test)]
mod tests {
    use tproj_mapping::{FieldDecl, TypeInfo, discover};

    use super::*;

    const TEXT_LIST: FieldType = FieldType::Sequence(&FieldType::Text);
    const INT_TABLE: FieldType = FieldType::Sequence(&FieldType::Sequence(&FieldType::Integer));

    static SAMPLE: TypeInfo = TypeInfo::new(
        "Sample",
        &[
            FieldDecl::new("name", FieldType::Text).single().at("meta/name"),
            FieldDecl::new("active", FieldType::Boolean).single().at("meta/@active"),
            FieldDecl::new("hosts", TEXT_LIST).plural().at("hosts/host"),
            FieldDecl::new("grid", INT_TABLE).plural().at("grid/row"),
            FieldDecl::new("bare", TEXT_LIST).plural(),
        ],
    );

    fn field(name: &str) -> FieldDescriptor {
        discover(&SAMPLE)
            .unwrap()
            .into_iter()
            .find(|d| d.name() == name)
            .unwrap()
    }

    fn texts(values: &[&str]) -> Value {
        Value::List(values.iter().map(|v| Value::Text((*v).to_string())).collect())
    }

    #[test]
    fn scalar_overwrites_in_place() {
        let mut node = Element::new("root");
        node.push_child(Element::new("first"));
        let name = field("name");
        XmlFormat
            .write_field(&mut node, &name, Some(&Value::Text("a".into())))
            .unwrap();
        node.push_child(Element::new("last"));
        XmlFormat
            .write_field(&mut node, &name, Some(&Value::Text("b".into())))
            .unwrap();
        let names: Vec<&str> = node.children().iter().map(Element::name).collect();
        assert_eq!(names, vec!["first", "meta", "last"]);
        assert_eq!(
            XmlFormat.read_field(&node, &name).unwrap(),
            Some(Value::Text("b".into()))
        );
    }

    #[test]
    fn scalar_none_removes_element_and_attribute() {
        let mut node = Element::new("root");
        let name = field("name");
        let active = field("active");
        XmlFormat
            .write_field(&mut node, &name, Some(&Value::Text("a".into())))
            .unwrap();
        XmlFormat
            .write_field(&mut node, &active, Some(&Value::Boolean(true)))
            .unwrap();
        assert_eq!(node.child("meta").unwrap().attribute("active"), Some("true"));

        XmlFormat.write_field(&mut node, &name, None).unwrap();
        XmlFormat.write_field(&mut node, &active, None).unwrap();
        assert!(node.child("meta").unwrap().is_empty());
        assert_eq!(XmlFormat.read_field(&node, &name).unwrap(), None);
        assert_eq!(XmlFormat.read_field(&node, &active).unwrap(), None);
    }

    #[test]
    fn collection_replaces_items_in_place() {
        let mut node = Element::new("root");
        let hosts = field("hosts");
        XmlFormat
            .write_field(&mut node, &hosts, Some(&texts(&["h1", "h2", "h3"])))
            .unwrap();
        node.child_mut("hosts").unwrap().push_child(Element::new("note"));
        XmlFormat
            .write_field(&mut node, &hosts, Some(&texts(&["h9"])))
            .unwrap();
        let container = node.child("hosts").unwrap();
        let names: Vec<&str> = container.children().iter().map(Element::name).collect();
        assert_eq!(names, vec!["host", "note"]);
        assert_eq!(
            XmlFormat.read_field(&node, &hosts).unwrap(),
            Some(texts(&["h9"]))
        );
    }

    #[test]
    fn empty_collection_keeps_wrapper_and_reads_empty() {
        let mut node = Element::new("root");
        let hosts = field("hosts");
        XmlFormat
            .write_field(&mut node, &hosts, Some(&Value::List(Vec::new())))
            .unwrap();
        assert!(node.child("hosts").unwrap().children().is_empty());
        assert_eq!(
            XmlFormat.read_field(&node, &hosts).unwrap(),
            Some(Value::List(Vec::new()))
        );
        let untouched = Element::new("root");
        assert_eq!(
            XmlFormat.read_field(&untouched, &hosts).unwrap(),
            Some(Value::List(Vec::new()))
        );
    }

    #[test]
    fn nested_collections_use_inner_items() {
        let mut node = Element::new("root");
        let grid = field("grid");
        let value = Value::List(vec![
            Value::List(vec![Value::Integer(1), Value::Integer(2)]),
            Value::List(Vec::new()),
            Value::List(vec![Value::Integer(3)]),
        ]);
        XmlFormat.write_field(&mut node, &grid, Some(&value)).unwrap();
        let rows: Vec<&Element> = node.child("grid").unwrap().children_named("row").collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].children_named(INNER_ITEM).count(), 2);
        assert_eq!(XmlFormat.read_field(&node, &grid).unwrap(), Some(value));
    }

    #[test]
    fn one_segment_collection_writes_items_directly() {
        let mut node = Element::new("root");
        let bare = field("bare");
        XmlFormat
            .write_field(&mut node, &bare, Some(&texts(&["x", "y"])))
            .unwrap();
        assert_eq!(node.children_named("bare").count(), 2);
        assert_eq!(
            XmlFormat.read_field(&node, &bare).unwrap(),
            Some(texts(&["x", "y"]))
        );
    }

    #[test]
    fn malformed_item_text_is_a_field_error() {
        let mut node = Element::new("root");
        let grid_row = node.ensure_descendant(&["grid", "row"]);
        grid_row.push_child(Element::with_text(INNER_ITEM, "not a number"));
        let err = XmlFormat.read_field(&node, &field("grid")).unwrap_err();
        assert!(matches!(err, MappingError::InvalidText { expected: "integer", .. }));
    }
}
