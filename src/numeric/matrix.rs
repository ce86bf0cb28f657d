//! Matrices as nested row and cell elements.
//!
//! ```xml
//! <matrix>
//!   <r><c>1</c><c>2</c></r>
//!   <r><c>3</c><c>4</c></r>
//! </matrix>
//! ```

use crate::document::{DocumentHandle, Tixi, TixiDocument};
use crate::error::{Result, TixiError};
use crate::tree::NodeId;
use crate::xpath::XNode;

use super::format::format_double;
use super::{check_name, parse_double};

pub const DEFAULT_MATRIX_NAME: &str = "matrix";
pub const DEFAULT_ROW_NAME: &str = "r";
pub const DEFAULT_COLUMN_NAME: &str = "c";

/// Order of the flat value slices exchanged with matrix functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// `(1,1), (1,2), ..., (2,1), ...`
    #[default]
    RowWise,
    /// `(1,1), (2,1), ..., (1,2), ...`
    ColumnWise,
}

impl StorageMode {
    /// Position of cell `(row, col)` (0-based) in a flat slice.
    #[must_use]
    pub fn index(self, row: usize, col: usize, n_rows: usize, n_cols: usize) -> usize {
        match self {
            Self::RowWise => row * n_cols + col,
            Self::ColumnWise => row + col * n_rows,
        }
    }
}

/// Converts the numeric storage mode (0 row-wise, 1 column-wise).
///
/// # Errors
///
/// `UNKNOWN_STORAGE_MODE` for any other value.
pub fn storage_mode_from_i32(value: i32) -> Result<StorageMode> {
    match value {
        0 => Ok(StorageMode::RowWise),
        1 => Ok(StorageMode::ColumnWise),
        other => Err(TixiError::UnknownStorageMode(other)),
    }
}

/// Element names of a matrix, defaults filled in and validated.
struct MatrixNames<'a> {
    matrix: &'a str,
    row: &'a str,
    col: &'a str,
}

impl<'a> MatrixNames<'a> {
    fn new(matrix: Option<&'a str>, row: Option<&'a str>, col: Option<&'a str>) -> Result<Self> {
        let names = Self {
            matrix: matrix.unwrap_or(DEFAULT_MATRIX_NAME),
            row: row.unwrap_or(DEFAULT_ROW_NAME),
            col: col.unwrap_or(DEFAULT_COLUMN_NAME),
        };
        for name in [names.matrix, names.row, names.col] {
            check_name(name)?;
        }
        Ok(names)
    }
}

fn dimensions(n_rows: i32, n_cols: i32) -> Result<(usize, usize)> {
    match (usize::try_from(n_rows), usize::try_from(n_cols)) {
        (Ok(rows), Ok(cols)) if rows > 0 && cols > 0 => Ok((rows, cols)),
        _ => Err(TixiError::MatrixDimensionError {
            rows: i64::from(n_rows),
            cols: i64::from(n_cols),
        }),
    }
}

impl TixiDocument {
    /// Appends a matrix of `n_rows` by `n_cols` cells, each holding the
    /// text `cell(i, j)` returns.
    fn build_matrix(
        &mut self,
        parent: &str,
        names: &MatrixNames<'_>,
        (n_rows, n_cols): (usize, usize),
        cell: impl Fn(usize, usize) -> String,
    ) -> Result<()> {
        let matrix = self.insert_element(parent, names.matrix, None, None, 0)?;
        for i in 0..n_rows {
            let row = self.append_text_child(matrix, names.row, "");
            for j in 0..n_cols {
                self.append_text_child(row, names.col, &cell(i, j));
            }
        }
        Ok(())
    }

    /// The row elements of the matrix at `path` and the cells of each.
    fn matrix_rows(&self, path: &str, row: &str, col: &str) -> Result<Vec<Vec<NodeId>>> {
        self.check_existence(path)?;
        let row_path = format!("{}/{row}", path.trim_end_matches('/'));
        let rows = match self.check_existence(&row_path) {
            Ok(rows) => rows,
            Err(TixiError::ElementNotFound(_)) => {
                return Err(TixiError::NonMatchingName {
                    path: path.to_string(),
                    expected: row.to_string(),
                    found: String::new(),
                })
            }
            Err(e) => return Err(e),
        };
        rows.into_iter()
            .filter_map(|node| match node {
                XNode::Node(id) => Some(id),
                XNode::Attribute(..) => None,
            })
            .map(|row_id| {
                self.tree
                    .children(row_id)
                    .filter(|&c| self.tree.is_element(c))
                    .map(|c| {
                        let name = self.tree.qualified_name(c).unwrap_or_default();
                        if name == col {
                            Ok(c)
                        } else {
                            Err(TixiError::NonMatchingName {
                                path: self.tree.node_path(row_id),
                                expected: col.to_string(),
                                found: name,
                            })
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

impl Tixi {
    /// Appends an empty matrix. `None` names default to `matrix`, `r` and
    /// `c`.
    ///
    /// # Errors
    ///
    /// `MATRIX_DIMENSION_ERROR` for fewer than one row or column,
    /// `INVALID_XML_NAME` for a bad name, plus the errors of
    /// [`Tixi::check_element`] for `parent`.
    #[allow(clippy::too_many_arguments)]
    pub fn create_matrix(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        matrix: Option<&str>,
        row: Option<&str>,
        col: Option<&str>,
        n_rows: i32,
        n_cols: i32,
    ) -> Result<()> {
        self.write(handle, |doc| {
            let shape = dimensions(n_rows, n_cols)?;
            let names = MatrixNames::new(matrix, row, col)?;
            doc.build_matrix(parent, &names, shape, |_, _| String::new())
        })
    }

    /// Appends a matrix filled from `values`, read in `mode` order.
    ///
    /// ```
    /// use tixi::{StorageMode, Tixi};
    ///
    /// let mut tixi = Tixi::new();
    /// let h = tixi.create_document("a").unwrap();
    /// let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    /// tixi.add_float_matrix(h, "/a", None, None, None, 2, 3, &values, StorageMode::RowWise, None)
    ///     .unwrap();
    /// assert_eq!(tixi.get_text_element(h, "/a/matrix/r[2]/c[1]").unwrap(), "4");
    /// assert_eq!(tixi.get_matrix_size(h, "/a/matrix", None, None).unwrap(), (2, 3));
    /// ```
    ///
    /// # Errors
    ///
    /// As [`Tixi::create_matrix`], plus `MATRIX_DIMENSION_ERROR` when
    /// `values` holds fewer than `n_rows * n_cols` values and `FAILED` for a
    /// bad format.
    #[allow(clippy::too_many_arguments)]
    pub fn add_float_matrix(
        &mut self,
        handle: DocumentHandle,
        parent: &str,
        matrix: Option<&str>,
        row: Option<&str>,
        col: Option<&str>,
        n_rows: i32,
        n_cols: i32,
        values: &[f64],
        mode: StorageMode,
        format: Option<&str>,
    ) -> Result<()> {
        self.write(handle, |doc| {
            let (rows, cols) = dimensions(n_rows, n_cols)?;
            if values.len() < rows * cols {
                return Err(TixiError::MatrixDimensionError {
                    rows: i64::from(n_rows),
                    cols: i64::from(n_cols),
                });
            }
            let names = MatrixNames::new(matrix, row, col)?;
            let texts = values[..rows * cols]
                .iter()
                .map(|&v| format_double(format, v))
                .collect::<Result<Vec<_>>>()?;
            doc.build_matrix(parent, &names, (rows, cols), |i, j| {
                texts[mode.index(i, j, rows, cols)].clone()
            })
        })
    }

    /// The number of rows and columns of the matrix at `path`.
    ///
    /// # Errors
    ///
    /// `NON_MATCHING_NAME` when there are no rows or a row holds an element
    /// that is not a cell, `NON_MATCHING_SIZE` when rows differ in length.
    pub fn get_matrix_size(
        &self,
        handle: DocumentHandle,
        path: &str,
        row: Option<&str>,
        col: Option<&str>,
    ) -> Result<(usize, usize)> {
        self.read(handle, |doc| {
            let row = row.unwrap_or(DEFAULT_ROW_NAME);
            let col = col.unwrap_or(DEFAULT_COLUMN_NAME);
            let rows = doc.matrix_rows(path, row, col)?;
            let n_cols = rows.first().map_or(0, Vec::len);
            if let Some(bad) = rows.iter().find(|cells| cells.len() != n_cols) {
                return Err(TixiError::NonMatchingSize {
                    path: path.to_string(),
                    expected: n_cols,
                    found: bad.len(),
                });
            }
            Ok((rows.len(), n_cols))
        })
    }

    /// Reads a matrix of exactly `n_rows` by `n_cols` cells into a flat
    /// vector in `mode` order.
    ///
    /// # Errors
    ///
    /// As [`Tixi::get_matrix_size`], plus `NON_MATCHING_SIZE` when the
    /// shape differs and `NO_NUMBER` for a cell that is not a number.
    #[allow(clippy::too_many_arguments)]
    pub fn get_float_matrix(
        &self,
        handle: DocumentHandle,
        path: &str,
        row: Option<&str>,
        col: Option<&str>,
        n_rows: usize,
        n_cols: usize,
        mode: StorageMode,
    ) -> Result<Vec<f64>> {
        self.read(handle, |doc| {
            let row = row.unwrap_or(DEFAULT_ROW_NAME);
            let col = col.unwrap_or(DEFAULT_COLUMN_NAME);
            let rows = doc.matrix_rows(path, row, col)?;
            if rows.len() != n_rows {
                return Err(TixiError::NonMatchingSize {
                    path: path.to_string(),
                    expected: n_rows,
                    found: rows.len(),
                });
            }
            let mut values = vec![0.0; n_rows * n_cols];
            for (i, cells) in rows.iter().enumerate() {
                if cells.len() != n_cols {
                    return Err(TixiError::NonMatchingSize {
                        path: format!("{path}/{row}[{}]", i + 1),
                        expected: n_cols,
                        found: cells.len(),
                    });
                }
                for (j, &cell) in cells.iter().enumerate() {
                    let cell_path = doc.tree.node_path(cell);
                    values[mode.index(i, j, n_rows, n_cols)] =
                        parse_double(&cell_path, &doc.tree.direct_text(cell))?;
                }
            }
            Ok(values)
        })
    }
}
