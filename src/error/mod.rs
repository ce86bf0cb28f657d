//! Error types for document access and XML parsing.
//!
//! Every public operation on [`crate::Tixi`] returns [`Result`]. The error
//! type [`TixiError`] carries context (paths, names, indices) and maps back
//! onto the stable numeric [`ReturnCode`] table via [`TixiError::code`], so
//! callers that speak in status codes can still do so.
//!
//! Parse failures keep their own structured [`ParseError`] with source
//! location tracking and collected diagnostics.

use std::fmt;

use thiserror::Error;

// -------------------------------------------------------------------------
// Return codes
// -------------------------------------------------------------------------

/// Stable status codes. The discriminants are part of the public contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ReturnCode {
    Success = 0,
    Failed = 1,
    InvalidXmlName = 2,
    NotWellFormed = 3,
    NotSchemaCompliant = 4,
    NotDtdCompliant = 5,
    InvalidHandle = 6,
    InvalidXPath = 7,
    ElementNotFound = 8,
    IndexOutOfRange = 9,
    NoPointFound = 10,
    NotAnElement = 11,
    AttributeNotFound = 12,
    OpenFailed = 13,
    OpenSchemaFailed = 14,
    OpenDtdFailed = 15,
    CloseFailed = 16,
    AlreadySaved = 17,
    ElementPathNotUnique = 18,
    NoElementName = 19,
    NoChildren = 20,
    ChildNotFound = 21,
    ErrorCreateRootNode = 22,
    DeallocationFailed = 23,
    NoNumber = 24,
    NoAttributeName = 25,
    StringTruncated = 26,
    NonMatchingName = 27,
    NonMatchingSize = 28,
    MatrixDimensionError = 29,
    CoordinateNotFound = 30,
    UnknownStorageMode = 31,
    UidNotUnique = 32,
    UidDontExists = 33,
    UidLinkBroken = 34,
    InvalidNamespaceUri = 35,
    InvalidNamespacePrefix = 36,
}

const ALL_CODES: [ReturnCode; 37] = [
    ReturnCode::Success,
    ReturnCode::Failed,
    ReturnCode::InvalidXmlName,
    ReturnCode::NotWellFormed,
    ReturnCode::NotSchemaCompliant,
    ReturnCode::NotDtdCompliant,
    ReturnCode::InvalidHandle,
    ReturnCode::InvalidXPath,
    ReturnCode::ElementNotFound,
    ReturnCode::IndexOutOfRange,
    ReturnCode::NoPointFound,
    ReturnCode::NotAnElement,
    ReturnCode::AttributeNotFound,
    ReturnCode::OpenFailed,
    ReturnCode::OpenSchemaFailed,
    ReturnCode::OpenDtdFailed,
    ReturnCode::CloseFailed,
    ReturnCode::AlreadySaved,
    ReturnCode::ElementPathNotUnique,
    ReturnCode::NoElementName,
    ReturnCode::NoChildren,
    ReturnCode::ChildNotFound,
    ReturnCode::ErrorCreateRootNode,
    ReturnCode::DeallocationFailed,
    ReturnCode::NoNumber,
    ReturnCode::NoAttributeName,
    ReturnCode::StringTruncated,
    ReturnCode::NonMatchingName,
    ReturnCode::NonMatchingSize,
    ReturnCode::MatrixDimensionError,
    ReturnCode::CoordinateNotFound,
    ReturnCode::UnknownStorageMode,
    ReturnCode::UidNotUnique,
    ReturnCode::UidDontExists,
    ReturnCode::UidLinkBroken,
    ReturnCode::InvalidNamespaceUri,
    ReturnCode::InvalidNamespacePrefix,
];

impl ReturnCode {
    /// Returns the numeric value of this code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Looks up a code by its numeric value.
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|i| ALL_CODES.get(i).copied())
    }

    /// Returns the constant name, e.g. `"ELEMENT_NOT_FOUND"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::InvalidXmlName => "INVALID_XML_NAME",
            Self::NotWellFormed => "NOT_WELL_FORMED",
            Self::NotSchemaCompliant => "NOT_SCHEMA_COMPLIANT",
            Self::NotDtdCompliant => "NOT_DTD_COMPLIANT",
            Self::InvalidHandle => "INVALID_HANDLE",
            Self::InvalidXPath => "INVALID_XPATH",
            Self::ElementNotFound => "ELEMENT_NOT_FOUND",
            Self::IndexOutOfRange => "INDEX_OUT_OF_RANGE",
            Self::NoPointFound => "NO_POINT_FOUND",
            Self::NotAnElement => "NOT_AN_ELEMENT",
            Self::AttributeNotFound => "ATTRIBUTE_NOT_FOUND",
            Self::OpenFailed => "OPEN_FAILED",
            Self::OpenSchemaFailed => "OPEN_SCHEMA_FAILED",
            Self::OpenDtdFailed => "OPEN_DTD_FAILED",
            Self::CloseFailed => "CLOSE_FAILED",
            Self::AlreadySaved => "ALREADY_SAVED",
            Self::ElementPathNotUnique => "ELEMENT_PATH_NOT_UNIQUE",
            Self::NoElementName => "NO_ELEMENT_NAME",
            Self::NoChildren => "NO_CHILDREN",
            Self::ChildNotFound => "CHILD_NOT_FOUND",
            Self::ErrorCreateRootNode => "EROROR_CREATE_ROOT_NODE",
            Self::DeallocationFailed => "DEALLOCATION_FAILED",
            Self::NoNumber => "NO_NUMBER",
            Self::NoAttributeName => "NO_ATTRIBUTE_NAME",
            Self::StringTruncated => "STRING_TRUNCATED",
            Self::NonMatchingName => "NON_MATCHING_NAME",
            Self::NonMatchingSize => "NON_MATCHING_SIZE",
            Self::MatrixDimensionError => "MATRIX_DIMENSION_ERROR",
            Self::CoordinateNotFound => "COORDINATE_NOT_FOUND",
            Self::UnknownStorageMode => "UNKNOWN_STORAGE_MODE",
            Self::UidNotUnique => "UID_NOT_UNIQUE",
            Self::UidDontExists => "UID_DONT_EXISTS",
            Self::UidLinkBroken => "UID_LINK_BROKEN",
            Self::InvalidNamespaceUri => "INVALID_NAMESPACE_URI",
            Self::InvalidNamespacePrefix => "INVALID_NAMESPACE_PREFIX",
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<T> From<&Result<T>> for ReturnCode {
    fn from(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(e) => e.code(),
        }
    }
}

// -------------------------------------------------------------------------
// TixiError
// -------------------------------------------------------------------------

/// Errors returned by document operations.
#[derive(Debug, Error)]
pub enum TixiError {
    #[error("{0}")]
    Failed(String),

    #[error("invalid XML name '{0}'")]
    InvalidXmlName(String),

    #[error("document is not well-formed: {0}")]
    NotWellFormed(#[from] ParseError),

    #[error("invalid document handle {0}")]
    InvalidHandle(i32),

    #[error("invalid XPath expression '{path}': {reason}")]
    InvalidXPath { path: String, reason: String },

    #[error("element '{0}' not found")]
    ElementNotFound(String),

    #[error("index {index} out of range for '{path}'")]
    IndexOutOfRange { path: String, index: i64 },

    #[error("no point found at '{0}'")]
    NoPointFound(String),

    #[error("'{0}' is not an element")]
    NotAnElement(String),

    #[error("attribute '{name}' not found at '{path}'")]
    AttributeNotFound { path: String, name: String },

    #[error("failed to open '{path}': {reason}")]
    OpenFailed { path: String, reason: String },

    #[error("failed to write '{path}': {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("document {0} has already been saved")]
    AlreadySaved(i32),

    #[error("path '{path}' matches {count} nodes")]
    ElementPathNotUnique { path: String, count: usize },

    #[error("value '{value}' at '{path}' is not a number")]
    NoNumber { path: String, value: String },

    #[error("no attribute name given")]
    NoAttributeName,

    #[error("unexpected element name '{found}' at '{path}', expected '{expected}'")]
    NonMatchingName {
        path: String,
        expected: String,
        found: String,
    },

    #[error("size mismatch at '{path}': expected {expected}, found {found}")]
    NonMatchingSize {
        path: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid matrix dimension {rows}x{cols}")]
    MatrixDimensionError { rows: i64, cols: i64 },

    #[error("coordinate '{0}' is not a number")]
    CoordinateNotFound(String),

    #[error("unknown storage mode {0}")]
    UnknownStorageMode(i32),

    #[error("uID '{0}' is not unique")]
    UidNotUnique(String),

    #[error("uID '{0}' does not exist")]
    UidDontExists(String),

    #[error("link to uID '{0}' is broken")]
    UidLinkBroken(String),

    #[error("invalid namespace URI '{0}'")]
    InvalidNamespaceUri(String),

    #[error("invalid namespace prefix '{0}'")]
    InvalidNamespacePrefix(String),
}

impl TixiError {
    /// Maps this error onto its status code.
    #[must_use]
    pub fn code(&self) -> ReturnCode {
        match self {
            Self::Failed(_) => ReturnCode::Failed,
            Self::InvalidXmlName(_) => ReturnCode::InvalidXmlName,
            Self::NotWellFormed(_) => ReturnCode::NotWellFormed,
            Self::InvalidHandle(_) => ReturnCode::InvalidHandle,
            Self::InvalidXPath { .. } => ReturnCode::InvalidXPath,
            Self::ElementNotFound(_) => ReturnCode::ElementNotFound,
            Self::IndexOutOfRange { .. } => ReturnCode::IndexOutOfRange,
            Self::NoPointFound(_) => ReturnCode::NoPointFound,
            Self::NotAnElement(_) => ReturnCode::NotAnElement,
            Self::AttributeNotFound { .. } => ReturnCode::AttributeNotFound,
            Self::OpenFailed { .. } => ReturnCode::OpenFailed,
            Self::WriteFailed { .. } => ReturnCode::Failed,
            Self::AlreadySaved(_) => ReturnCode::AlreadySaved,
            Self::ElementPathNotUnique { .. } => ReturnCode::ElementPathNotUnique,
            Self::NoNumber { .. } => ReturnCode::NoNumber,
            Self::NoAttributeName => ReturnCode::NoAttributeName,
            Self::NonMatchingName { .. } => ReturnCode::NonMatchingName,
            Self::NonMatchingSize { .. } => ReturnCode::NonMatchingSize,
            Self::MatrixDimensionError { .. } => ReturnCode::MatrixDimensionError,
            Self::CoordinateNotFound(_) => ReturnCode::CoordinateNotFound,
            Self::UnknownStorageMode(_) => ReturnCode::UnknownStorageMode,
            Self::UidNotUnique(_) => ReturnCode::UidNotUnique,
            Self::UidDontExists(_) => ReturnCode::UidDontExists,
            Self::UidLinkBroken(_) => ReturnCode::UidLinkBroken,
            Self::InvalidNamespaceUri(_) => ReturnCode::InvalidNamespaceUri,
            Self::InvalidNamespacePrefix(_) => ReturnCode::InvalidNamespacePrefix,
        }
    }

    pub(crate) fn invalid_xpath(path: &str, reason: impl fmt::Display) -> Self {
        Self::InvalidXPath {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn attribute_not_found(path: &str, name: &str) -> Self {
        Self::AttributeNotFound {
            path: path.to_string(),
            name: name.to_string(),
        }
    }

    pub(crate) fn index_out_of_range(path: &str, index: i64) -> Self {
        Self::IndexOutOfRange {
            path: path.to_string(),
            index,
        }
    }

    pub(crate) fn no_number(path: &str, value: &str) -> Self {
        Self::NoNumber {
            path: path.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn open_failed(path: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::OpenFailed {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TixiError>;

// -------------------------------------------------------------------------
// Parse diagnostics
// -------------------------------------------------------------------------

/// Severity level for a parse diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Fatal => write!(f, "fatal error"),
        }
    }
}

/// Source location within an XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A non-fatal diagnostic emitted during parsing.
#[derive(Debug, Clone)]
pub struct ParseDiagnostic {
    pub severity: ErrorSeverity,
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.severity, self.message, self.location)
    }
}

/// The error returned when XML input is not well-formed.
#[derive(Debug, Clone, Error)]
#[error("parse error at {location}: {message}")]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where in the source the fatal error occurred.
    pub location: SourceLocation,
    /// Warnings collected before the fatal error.
    pub diagnostics: Vec<ParseDiagnostic>,
}
