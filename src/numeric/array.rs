//! Multi-dimensional arrays.
//!
//! An array element holds one `mapType="vector"` child per dimension (the
//! axis values) and any number of `mapType="array"` children, each a flat
//! `;`-separated list with the last dimension varying fastest:
//!
//! ```xml
//! <table>
//!   <mach mapType="vector">0.2;0.5</mach>
//!   <alpha mapType="vector">0;2;4</alpha>
//!   <cl mapType="array">0.1;0.2;0.3;0.11;0.21;0.31</cl>
//! </table>
//! ```

use crate::document::{DocumentHandle, Tixi, TixiDocument};
use crate::error::{Result, TixiError};
use crate::tree::NodeId;
use crate::xpath::XNode;

use super::{parse_vector, vector_tokens, MAP_TYPE};

const VECTOR: &str = "vector";
const ARRAY: &str = "array";

impl TixiDocument {
    /// Element children of the nodes at `path` whose `mapType` is
    /// `map_type`, in document order.
    fn array_elements(&self, path: &str, map_type: &str) -> Result<Vec<NodeId>> {
        let parents = self.select(path)?;
        let found: Vec<NodeId> = parents
            .into_iter()
            .filter_map(|node| match node {
                XNode::Node(id) => Some(id),
                XNode::Attribute(..) => None,
            })
            .flat_map(|id| self.tree.children(id))
            .filter(|&c| self.tree.attribute(c, MAP_TYPE) == Some(map_type))
            .collect();
        if found.is_empty() {
            return Err(TixiError::ElementNotFound(format!(
                "{path}/*[@{MAP_TYPE}='{map_type}']"
            )));
        }
        Ok(found)
    }

    fn dimension_text(&self, id: NodeId) -> Result<String> {
        if self.tree.first_child(id).is_none() {
            return Err(TixiError::ElementNotFound(format!(
                "{}/text()",
                self.tree.node_path(id)
            )));
        }
        Ok(self.tree.direct_text(id))
    }
}

/// Reads one value out of a flat array. `dim_sizes` and `positions` hold
/// one 0-based entry per dimension, the last dimension varying fastest.
///
/// ```
/// use tixi::numeric::array::get_array_value;
///
/// let values = [0.0, 1.0, 2.0, 10.0, 11.0, 12.0];
/// assert_eq!(get_array_value(&values, &[2, 3], &[1, 2]).unwrap(), 12.0);
/// ```
///
/// # Errors
///
/// `INDEX_OUT_OF_RANGE` for a position outside its dimension or past the
/// end of `values`, `FAILED` when the two index slices differ in length or
/// are empty.
pub fn get_array_value(values: &[f64], dim_sizes: &[usize], positions: &[usize]) -> Result<f64> {
    if dim_sizes.is_empty() || dim_sizes.len() != positions.len() {
        return Err(TixiError::Failed(format!(
            "{} dimension sizes but {} positions",
            dim_sizes.len(),
            positions.len()
        )));
    }
    let mut index = 0;
    for (dim, (&size, &pos)) in dim_sizes.iter().zip(positions).enumerate() {
        if pos >= size {
            return Err(TixiError::index_out_of_range(
                &format!("dimension {dim}"),
                i64::try_from(pos).unwrap_or(i64::MAX),
            ));
        }
        index = index * size + pos;
    }
    values.get(index).copied().ok_or_else(|| {
        TixiError::index_out_of_range("array", i64::try_from(index).unwrap_or(i64::MAX))
    })
}

impl Tixi {
    /// The number of children of `path` with the given `mapType`.
    ///
    /// # Errors
    ///
    /// `INVALID_XPATH` for a bad path, `ELEMENT_NOT_FOUND` when no child
    /// matches.
    pub fn get_array_element_count(
        &self,
        handle: DocumentHandle,
        path: &str,
        map_type: &str,
    ) -> Result<usize> {
        self.read(handle, |doc| Ok(doc.array_elements(path, map_type)?.len()))
    }

    /// The names of the children of `path` with the given `mapType`.
    ///
    /// # Errors
    ///
    /// As [`Tixi::get_array_element_count`].
    pub fn get_array_element_names(
        &self,
        handle: DocumentHandle,
        path: &str,
        map_type: &str,
    ) -> Result<Vec<String>> {
        self.read(handle, |doc| {
            Ok(doc
                .array_elements(path, map_type)?
                .into_iter()
                .filter_map(|id| doc.tree.qualified_name(id))
                .collect())
        })
    }

    /// The number of dimension vectors of the array at `path`.
    ///
    /// # Errors
    ///
    /// As [`Tixi::get_array_element_count`].
    pub fn get_array_dimensions(&self, handle: DocumentHandle, path: &str) -> Result<usize> {
        self.get_array_element_count(handle, path, VECTOR)
    }

    /// # Errors
    ///
    /// As [`Tixi::get_array_element_count`].
    pub fn get_array_dimension_names(&self, handle: DocumentHandle, path: &str) -> Result<Vec<String>> {
        self.get_array_element_names(handle, path, VECTOR)
    }

    /// The number of value lists of the array at `path`.
    ///
    /// # Errors
    ///
    /// As [`Tixi::get_array_element_count`].
    pub fn get_array_parameters(&self, handle: DocumentHandle, path: &str) -> Result<usize> {
        self.get_array_element_count(handle, path, ARRAY)
    }

    /// # Errors
    ///
    /// As [`Tixi::get_array_element_count`].
    pub fn get_array_parameter_names(&self, handle: DocumentHandle, path: &str) -> Result<Vec<String>> {
        self.get_array_element_names(handle, path, ARRAY)
    }

    /// The value count of each dimension and the product of all counts.
    ///
    /// # Errors
    ///
    /// As [`Tixi::get_array_element_count`], plus `ELEMENT_NOT_FOUND` for an
    /// empty dimension element.
    pub fn get_array_dimension_sizes(
        &self,
        handle: DocumentHandle,
        path: &str,
    ) -> Result<(Vec<usize>, usize)> {
        self.read(handle, |doc| {
            let sizes = doc
                .array_elements(path, VECTOR)?
                .into_iter()
                .map(|id| Ok(vector_tokens(&doc.dimension_text(id)?).count()))
                .collect::<Result<Vec<usize>>>()?;
            let total = sizes.iter().product();
            Ok((sizes, total))
        })
    }

    /// The axis values of dimension `dim` (0-based).
    ///
    /// # Errors
    ///
    /// `ELEMENT_NOT_FOUND` when the array has no such dimension, `NO_NUMBER`
    /// for a value that is not a number.
    pub fn get_array_dimension_values(
        &self,
        handle: DocumentHandle,
        path: &str,
        dim: usize,
    ) -> Result<Vec<f64>> {
        self.read(handle, |doc| {
            let dims = doc.array_elements(path, VECTOR)?;
            let Some(&id) = dims.get(dim) else {
                return Err(TixiError::ElementNotFound(format!(
                    "{path}/*[@{MAP_TYPE}='{VECTOR}'][{}]",
                    dim + 1
                )));
            };
            parse_vector(&doc.tree.node_path(id), &doc.dimension_text(id)?)
        })
    }

    /// The values of the list `path/element`, which must hold exactly
    /// `size` values.
    ///
    /// # Errors
    ///
    /// `ELEMENT_NOT_FOUND` when nothing matches, `ATTRIBUTE_NOT_FOUND` when
    /// the first match is not `mapType="array"` or is empty,
    /// `NON_MATCHING_SIZE` for a different number of values.
    pub fn get_array(
        &self,
        handle: DocumentHandle,
        path: &str,
        element: &str,
        size: usize,
    ) -> Result<Vec<f64>> {
        self.read(handle, |doc| {
            let list_path = format!("{}/{element}", path.trim_end_matches('/'));
            let first = doc.check_existence(&list_path)?[0];
            let id = match first {
                XNode::Node(id)
                    if doc.tree.attribute(id, MAP_TYPE) == Some(ARRAY)
                        && doc.tree.first_child(id).is_some() =>
                {
                    id
                }
                _ => return Err(TixiError::attribute_not_found(&list_path, MAP_TYPE)),
            };
            let values = parse_vector(&list_path, &doc.tree.direct_text(id))?;
            if values.len() != size {
                return Err(TixiError::NonMatchingSize {
                    path: list_path,
                    expected: size,
                    found: values.len(),
                });
            }
            Ok(values)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ReturnCode;
    use pretty_assertions::assert_eq;

    const TABLE: &str = r#"<a><table>
        <mach mapType="vector">0.2;0.5</mach>
        <alpha mapType="vector">0;2;4</alpha>
        <note>not an array</note>
        <cl mapType="array">0.1;0.2;0.3;0.11;0.21;0.31</cl>
        <cd mapType="array">1;2</cd>
        <empty mapType="vector"/>
    </table><plain/></a>"#;

    fn open() -> (Tixi, DocumentHandle) {
        let mut tixi = Tixi::new();
        let h = tixi.import_from_string(TABLE).unwrap();
        (tixi, h)
    }

    #[test]
    fn test_element_counts_and_names() {
        let (tixi, h) = open();
        assert_eq!(tixi.get_array_dimensions(h, "/a/table").unwrap(), 3);
        assert_eq!(
            tixi.get_array_dimension_names(h, "/a/table").unwrap(),
            vec!["mach", "alpha", "empty"]
        );
        assert_eq!(tixi.get_array_parameters(h, "/a/table").unwrap(), 2);
        assert_eq!(
            tixi.get_array_parameter_names(h, "/a/table").unwrap(),
            vec!["cl", "cd"]
        );
        assert_eq!(
            tixi.get_array_element_count(h, "/a/plain", "vector").unwrap_err().code(),
            ReturnCode::ElementNotFound
        );
        assert_eq!(
            tixi.get_array_element_count(h, "/a/[", "vector").unwrap_err().code(),
            ReturnCode::InvalidXPath
        );
    }

    #[test]
    fn test_dimension_sizes_and_values() {
        let mut tixi = Tixi::new();
        let h = tixi
            .import_from_string(
                r#"<t><m mapType="vector">0.2;0.5</m><a mapType="vector">0;2;4</a></t>"#,
            )
            .unwrap();
        assert_eq!(tixi.get_array_dimension_sizes(h, "/t").unwrap(), (vec![2, 3], 6));
        assert_eq!(
            tixi.get_array_dimension_values(h, "/t", 1).unwrap(),
            vec![0.0, 2.0, 4.0]
        );
        assert_eq!(
            tixi.get_array_dimension_values(h, "/t", 2).unwrap_err().code(),
            ReturnCode::ElementNotFound
        );

        let (tixi, h) = open();
        assert_eq!(
            tixi.get_array_dimension_sizes(h, "/a/table").unwrap_err().code(),
            ReturnCode::ElementNotFound
        );
    }

    #[test]
    fn test_get_array() {
        let (tixi, h) = open();
        let cl = tixi.get_array(h, "/a/table", "cl", 6).unwrap();
        assert_eq!(cl.len(), 6);
        assert_eq!(get_array_value(&cl, &[2, 3], &[1, 0]).unwrap(), 0.11);
        assert_eq!(
            tixi.get_array(h, "/a/table", "cl", 5).unwrap_err().code(),
            ReturnCode::NonMatchingSize
        );
        assert_eq!(
            tixi.get_array(h, "/a/table", "mach", 2).unwrap_err().code(),
            ReturnCode::AttributeNotFound
        );
        assert_eq!(
            tixi.get_array(h, "/a/table", "nothing", 2).unwrap_err().code(),
            ReturnCode::ElementNotFound
        );
    }

    #[test]
    fn test_array_value_bounds() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(get_array_value(&values, &[2, 2], &[0, 1]).unwrap(), 2.0);
        assert_eq!(get_array_value(&values, &[4], &[3]).unwrap(), 4.0);
        assert_eq!(
            get_array_value(&values, &[2, 2], &[2, 0]).unwrap_err().code(),
            ReturnCode::IndexOutOfRange
        );
        assert_eq!(
            get_array_value(&values, &[2, 3], &[1, 2]).unwrap_err().code(),
            ReturnCode::IndexOutOfRange
        );
        assert_eq!(
            get_array_value(&values, &[2], &[0, 0]).unwrap_err().code(),
            ReturnCode::Failed
        );
    }
}
