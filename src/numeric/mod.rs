//! Numbers stored in documents: vectors, matrices, points and lists.
//!
//! A vector is a single element whose text holds `;`-separated values and
//! which carries `mapType="vector"`:
//!
//! ```xml
//! <x mapType="vector">0;0.5;1</x>
//! ```
//!
//! Matrices are nested elements, one per row and one per cell. Arrays (see
//! [`array`]) combine several dimension vectors with flat value lists.

pub mod array;
pub mod format;
mod matrix;

pub use matrix::{
    storage_mode_from_i32, StorageMode, DEFAULT_COLUMN_NAME, DEFAULT_MATRIX_NAME,
    DEFAULT_ROW_NAME,
};

use crate::document::{DocumentHandle, Tixi, TixiDocument};
use crate::error::{Result, TixiError};
use crate::tree::{is_valid_qname, NodeId};
use crate::xpath::XNode;

use format::format_double;

/// Separates the values of a vector.
pub const VECTOR_SEPARATOR: char = ';';
/// Attribute naming the kind of a numeric element.
pub const MAP_TYPE: &str = "mapType";

const VECTOR: &str = "vector";

/// Parses trimmed text as an integer.
pub(crate) fn parse_integer(path: &str, text: &str) -> Result<i32> {
    text.trim()
        .parse()
        .map_err(|_| TixiError::no_number(path, text))
}

/// Parses trimmed text as a floating point number.
pub(crate) fn parse_double(path: &str, text: &str) -> Result<f64> {
    text.trim()
        .parse()
        .map_err(|_| TixiError::no_number(path, text))
}

/// The non-empty `;`-separated tokens of `text`.
pub(crate) fn vector_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(VECTOR_SEPARATOR)
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub(crate) fn parse_vector(path: &str, text: &str) -> Result<Vec<f64>> {
    vector_tokens(text).map(|t| parse_double(path, t)).collect()
}

fn join_values(values: &[f64], format: Option<&str>) -> Result<String> {
    let mut text = String::new();
    for (i, &value) in values.iter().enumerate() {
        if i > 0 {
            text.push(VECTOR_SEPARATOR);
        }
        text.push_str(&format_double(format, value)?);
    }
    Ok(text)
}

fn check_name(name: &str) -> Result<()> {
    if is_valid_qname(name) {
        Ok(())
    } else {
        Err(TixiError::InvalidXmlName(name.to_string()))
    }
}

impl TixiDocument {
    /// The text of the vector element at `path`.
    fn vector_text(&self, path: &str) -> Result<String> {
        let id = self.check_element(path)?;
        let Some(map_type) = self.tree.attribute(id, MAP_TYPE) else {
            return Err(TixiError::attribute_not_found(path, MAP_TYPE));
        };
        if !map_type.eq_ignore_ascii_case(VECTOR) {
            return Err(TixiError::ElementNotFound(format!(
                "{path}[@{MAP_TYPE}='{VECTOR}']"
            )));
        }
        Ok(self.tree.direct_text(id))
    }

    fn point_coordinate(&self, point: NodeId, path: &str, axis: &str) -> Result<Option<f64>> {
        let Some(coordinate) = self.tree.child_elements_named(point, axis).next() else {
            return Ok(None);
        };
        let text = self.tree.direct_text(coordinate);
        text.trim()
            .parse()
            .map(Some)
            .map_err(|_| TixiError::CoordinateNotFound(format!("{path}/{axis}")))
    }
}

impl Tixi {
    // ---------------------------------------------------------------------
    // Vectors
    // ---------------------------------------------------------------------

    /// Appends `<name mapType="vector">v1;v2;...</name>` to `parent`.
    ///
    /// ```
    /// use tixi::Tixi;
    ///
    /// let mut tixi = Tixi::new();
    /// let h = tixi.create_document("a").unwrap();
    /// tixi.add_float_vector(h, "/a", "x", &[0.0, 0.5, 1.0], None).unwrap();
    /// assert_eq!(tixi.get_text_element(h, "/a/x").unwrap(), "0;0.5;1");
    /// assert_eq!(tixi.get_vector_size(h, "/a/x").unwrap(), 3);
    /// ```
    ///
    /// # Errors
    ///
    /// `FAILED` for an empty slice or a bad format, plus the errors of
    /// [`Tixi::add_text_element`].
    pub fn add_float_vector(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        name: &str,
        values: &[f64],
        format: Option<&str>,
    ) -> Result<()> {
        self.write(handle, |doc| {
            if values.is_empty() {
                return Err(TixiError::Failed(format!("vector '{name}' has no values")));
            }
            let text = join_values(values, format)?;
            let id = doc.insert_element(parent, name, None, Some(&text), 0)?;
            doc.tree.set_attribute(id, MAP_TYPE, VECTOR);
            Ok(())
        })
    }

    /// Rewrites the values of the element at `path` and marks it as a
    /// vector.
    ///
    /// # Errors
    ///
    /// `FAILED` for an empty slice or a bad format, plus the errors of
    /// [`Tixi::check_element`].
    pub fn update_float_vector(
        &mut self,
        handle: DocumentHandle,
        path: &str,
        values: &[f64],
        format: Option<&str>,
    ) -> Result<()> {
        self.write(handle, |doc| {
            if values.is_empty() {
                return Err(TixiError::Failed(format!("vector '{path}' has no values")));
            }
            let text = join_values(values, format)?;
            let id = doc.check_element(path)?;
            doc.replace_text(id, &text);
            doc.tree.set_attribute(id, MAP_TYPE, VECTOR);
            Ok(())
        })
    }

    /// The number of values in the vector at `path`.
    ///
    /// # Errors
    ///
    /// `ATTRIBUTE_NOT_FOUND` without a `mapType` attribute,
    /// `ELEMENT_NOT_FOUND` when it is not `vector`.
    pub fn get_vector_size(&self, handle: DocumentHandle, path: &str) -> Result<usize> {
        self.read(handle, |doc| Ok(vector_tokens(&doc.vector_text(path)?).count()))
    }

    /// The first `count` values of the vector at `path`.
    ///
    /// # Errors
    ///
    /// As [`Tixi::get_vector_size`], plus `INDEX_OUT_OF_RANGE` when the
    /// vector is shorter than `count` and `NO_NUMBER` for a value that is
    /// not a number.
    pub fn get_float_vector(&self, handle: DocumentHandle, path: &str, count: usize) -> Result<Vec<f64>> {
        self.read(handle, |doc| {
            let text = doc.vector_text(path)?;
            let values: Vec<f64> = vector_tokens(&text)
                .take(count)
                .map(|t| parse_double(path, t))
                .collect::<Result<_>>()?;
            if values.len() < count {
                return Err(TixiError::index_out_of_range(
                    path,
                    i64::try_from(count).unwrap_or(i64::MAX),
                ));
            }
            Ok(values)
        })
    }

    // ---------------------------------------------------------------------
    // Points
    // ---------------------------------------------------------------------

    /// Appends `x`, `y` and `z` children to the element at `parent`.
    ///
    /// # Errors
    ///
    /// `FAILED` for a bad format, plus the errors of
    /// [`Tixi::check_element`].
    pub fn add_point(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        x: f64,
        y: f64,
        z: f64,
        format: Option<&str>,
    ) -> Result<()> {
        self.write(handle, |doc| {
            let texts = [
                format_double(format, x)?,
                format_double(format, y)?,
                format_double(format, z)?,
            ];
            let id = doc.check_element(parent)?;
            for (axis, text) in ["x", "y", "z"].into_iter().zip(&texts) {
                doc.append_text_child(id, axis, text);
            }
            Ok(())
        })
    }

    /// Reads the coordinates of the first element matched by `path`. A
    /// missing coordinate reads as 0.
    ///
    /// # Errors
    ///
    /// `NO_POINT_FOUND` when nothing matches or no coordinate is present,
    /// `COORDINATE_NOT_FOUND` for a coordinate that is not a number.
    pub fn get_point(&self, handle: DocumentHandle, path: &str) -> Result<(f64, f64, f64)> {
        self.read(handle, |doc| {
            let point = match doc.check_existence(path) {
                Ok(nodes) => nodes.into_iter().find_map(|n| match n {
                    XNode::Node(id) if doc.tree.is_element(id) => Some(id),
                    _ => None,
                }),
                Err(TixiError::ElementNotFound(_)) => None,
                Err(e) => return Err(e),
            };
            let Some(point) = point else {
                return Err(TixiError::NoPointFound(path.to_string()));
            };
            let x = doc.point_coordinate(point, path, "x")?;
            let y = doc.point_coordinate(point, path, "y")?;
            let z = doc.point_coordinate(point, path, "z")?;
            if x.is_none() && y.is_none() && z.is_none() {
                return Err(TixiError::NoPointFound(path.to_string()));
            }
            Ok((x.unwrap_or(0.0), y.unwrap_or(0.0), z.unwrap_or(0.0)))
        })
    }

    // ---------------------------------------------------------------------
    // Lists
    // ---------------------------------------------------------------------

    /// Appends `<list><child attribute="a1">v1</child>...</list>` to
    /// `parent`.
    ///
    /// # Errors
    ///
    /// `NON_MATCHING_SIZE` when `values` and `attribute_values` differ in
    /// length, `INVALID_XML_NAME` for a bad element or attribute name.
    #[allow(clippy::too_many_arguments)]
    pub fn add_double_list_with_attributes(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        list: &str,
        child: &str,
        attribute: &str,
        values: &[f64],
        format: Option<&str>,
        attribute_values: &[&str],
    ) -> Result<()> {
        self.write(handle, |doc| {
            for name in [list, child, attribute] {
                check_name(name)?;
            }
            if values.len() != attribute_values.len() {
                return Err(TixiError::NonMatchingSize {
                    path: format!("{parent}/{list}"),
                    expected: values.len(),
                    found: attribute_values.len(),
                });
            }
            let texts = values
                .iter()
                .map(|&v| format_double(format, v))
                .collect::<Result<Vec<_>>>()?;
            let list_id = doc.insert_element(parent, list, None, None, 0)?;
            for (text, &attribute_value) in texts.iter().zip(attribute_values) {
                let id = doc.append_text_child(list_id, child, text);
                doc.tree.set_attribute(id, attribute, attribute_value);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ReturnCode;
    use pretty_assertions::assert_eq;

    fn compact(xml: &str) -> (Tixi, DocumentHandle) {
        let mut tixi = Tixi::new();
        let h = tixi.import_from_string(xml).unwrap();
        tixi.use_pretty_print(h, 0).unwrap();
        (tixi, h)
    }

    #[test]
    fn test_strict_number_parsing() {
        assert_eq!(parse_integer("/p", " 12 ").unwrap(), 12);
        assert!(parse_integer("/p", "12.5").is_err());
        assert!(parse_integer("/p", "").is_err());
        assert!((parse_double("/p", "\n1e-3\t").unwrap() - 0.001).abs() < 1e-15);
        assert_eq!(
            parse_double("/p", "1.0abc").unwrap_err().code(),
            ReturnCode::NoNumber
        );
    }

    #[test]
    fn test_vector_round_trip() {
        let (mut tixi, h) = compact("<a/>");
        tixi.add_float_vector(h, "/a", "v", &[1.0, 2.5, -3.0], Some("%.1f"))
            .unwrap();
        assert_eq!(tixi.get_text_element(h, "/a/v").unwrap(), "1.0;2.5;-3.0");
        assert_eq!(tixi.get_text_attribute(h, "/a/v", "mapType").unwrap(), "vector");
        assert_eq!(tixi.get_float_vector(h, "/a/v", 2).unwrap(), vec![1.0, 2.5]);
        assert_eq!(
            tixi.get_float_vector(h, "/a/v", 4).unwrap_err().code(),
            ReturnCode::IndexOutOfRange
        );
        tixi.update_float_vector(h, "/a/v", &[7.0], None).unwrap();
        assert_eq!(tixi.get_vector_size(h, "/a/v").unwrap(), 1);
        assert_eq!(
            tixi.add_float_vector(h, "/a", "w", &[], None).unwrap_err().code(),
            ReturnCode::Failed
        );
    }

    #[test]
    fn test_vector_map_type_checks() {
        let (tixi, h) = compact(
            r#"<a><v mapType="Vector">1;;2; </v><n>1;2</n><o mapType="array">1</o></a>"#,
        );
        assert_eq!(tixi.get_vector_size(h, "/a/v").unwrap(), 2);
        assert_eq!(
            tixi.get_vector_size(h, "/a/n").unwrap_err().code(),
            ReturnCode::AttributeNotFound
        );
        assert_eq!(
            tixi.get_vector_size(h, "/a/o").unwrap_err().code(),
            ReturnCode::ElementNotFound
        );
    }

    #[test]
    fn test_points() {
        let (mut tixi, h) = compact(
            "<a><p><x>1</x><z>3</z></p><q><y>bad</y></q><e><w/></e></a>",
        );
        assert_eq!(tixi.get_point(h, "/a/p").unwrap(), (1.0, 0.0, 3.0));
        assert_eq!(
            tixi.get_point(h, "/a/q").unwrap_err().code(),
            ReturnCode::CoordinateNotFound
        );
        assert_eq!(
            tixi.get_point(h, "/a/e").unwrap_err().code(),
            ReturnCode::NoPointFound
        );
        assert_eq!(
            tixi.get_point(h, "/a/none").unwrap_err().code(),
            ReturnCode::NoPointFound
        );
        tixi.create_element(h, "/a", "r").unwrap();
        tixi.add_point(h, "/a/r", 0.5, -1.0, 2.0, None).unwrap();
        assert_eq!(
            tixi.export_element_as_string(h, "/a/r").unwrap(),
            "<r><x>0.5</x><y>-1</y><z>2</z></r>"
        );
        assert_eq!(tixi.get_point(h, "/a/r").unwrap(), (0.5, -1.0, 2.0));
    }

    #[test]
    fn test_double_list_with_attributes() {
        let (mut tixi, h) = compact("<a/>");
        tixi.add_double_list_with_attributes(
            h,
            "/a",
            "list",
            "v",
            "id",
            &[1.0, 2.0],
            Some("%.1f"),
            &["one", "two"],
        )
        .unwrap();
        assert_eq!(
            tixi.export_element_as_string(h, "/a/list").unwrap(),
            r#"<list><v id="one">1.0</v><v id="two">2.0</v></list>"#
        );
        let err = tixi
            .add_double_list_with_attributes(h, "/a", "list", "v", "id", &[1.0], None, &[])
            .unwrap_err();
        assert_eq!(err.code(), ReturnCode::NonMatchingSize);
    }
}
