//! Tab-delimited line codec for historic snapshot records.
//!
//! ## Line Layout
//!
//! One line per concept, 26 tab-separated columns in the fixed order given
//! by [`SCHEMA`]. Id lists are comma-joined inside a single column and an
//! empty list is an empty token, so every line always carries every column.
//!
//! ```text
//! id  fsn  Y|N  SD|P  hierarchy  ip  sd_anc  sd_desc
//!     [active ids  inactive ids] x 8  module  attrs
//! ```
//!
//! Encode and decode are both driven by [`SCHEMA`], so the two directions
//! cannot drift apart.

use std::collections::BTreeSet;

use crate::hierarchy::HierarchyBucket;
use crate::types::{ComponentId, ComponentType, DefinitionStatus, SctId};
use super::datum::{ComponentIdSets, HistoricDatum};

/// Column delimiter.
pub const FIELD_SEPARATOR: char = '\t';

/// Separator between ids inside a list column.
pub const LIST_SEPARATOR: char = ',';

/// Number of columns in every line.
pub const COLUMN_COUNT: usize = 26;

/// Errors raised while encoding or decoding a snapshot line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Wrong number of columns.
    #[error("line {line}: expected {expected} columns, found {found}: {raw:?}")]
    ColumnCount {
        /// 1-based line number.
        line: usize,
        /// Required column count.
        expected: usize,
        /// Columns present.
        found: usize,
        /// Raw line content.
        raw: String,
    },
    /// A column value could not be parsed.
    #[error("line {line}: invalid {column} value {value:?}: {raw:?}")]
    InvalidField {
        /// 1-based line number.
        line: usize,
        /// Column name.
        column: &'static str,
        /// Offending value.
        value: String,
        /// Raw line content.
        raw: String,
    },
    /// An id was listed as both active and inactive.
    #[error("line {line}: {component_type} id {id} is both active and inactive: {raw:?}")]
    OverlappingIds {
        /// 1-based line number.
        line: usize,
        /// Component type of the lists.
        component_type: ComponentType,
        /// Offending id.
        id: ComponentId,
        /// Raw line content.
        raw: String,
    },
    /// The line is not valid UTF-8.
    #[error("line {line}: not valid UTF-8: {raw:?}")]
    InvalidEncoding {
        /// 1-based line number.
        line: usize,
        /// Raw line content, with invalid bytes replaced.
        raw: String,
    },
    /// The FSN holds a character that would break the line layout.
    #[error("concept {concept_id}: fsn contains a tab or line break and cannot be encoded")]
    UnencodableFsn {
        /// Concept being encoded.
        concept_id: SctId,
    },
}

/// One column of the line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// Concept SCTID.
    ConceptId,
    /// Fully specified name.
    Fsn,
    /// `Y` / `N`.
    Active,
    /// `SD` / `P`.
    DefinitionStatus,
    /// Top-level hierarchy SCTID, `0` when unknown.
    Hierarchy,
    /// `Y` / `N`.
    IntermediatePrimitive,
    /// `Y` / `N`.
    HasSdAncestor,
    /// `Y` / `N`.
    HasSdDescendant,
    /// Comma-joined active ids of a tracked type.
    ActiveIds(ComponentType),
    /// Comma-joined inactive ids of a tracked type.
    InactiveIds(ComponentType),
    /// Module SCTID.
    ModuleId,
    /// `Y` / `N`.
    HasAttributes,
}

use ComponentType as T;

/// The agreed column order.
pub const SCHEMA: [Column; COLUMN_COUNT] = [
    Column::ConceptId,
    Column::Fsn,
    Column::Active,
    Column::DefinitionStatus,
    Column::Hierarchy,
    Column::IntermediatePrimitive,
    Column::HasSdAncestor,
    Column::HasSdDescendant,
    Column::ActiveIds(T::Description),
    Column::InactiveIds(T::Description),
    Column::ActiveIds(T::TextDefinition),
    Column::InactiveIds(T::TextDefinition),
    Column::ActiveIds(T::Relationship),
    Column::InactiveIds(T::Relationship),
    Column::ActiveIds(T::ConcreteRelationship),
    Column::InactiveIds(T::ConcreteRelationship),
    Column::ActiveIds(T::Axiom),
    Column::InactiveIds(T::Axiom),
    Column::ActiveIds(T::LangRefsetEntry),
    Column::InactiveIds(T::LangRefsetEntry),
    Column::ActiveIds(T::InactivationIndicator),
    Column::InactiveIds(T::InactivationIndicator),
    Column::ActiveIds(T::HistoricalAssociation),
    Column::InactiveIds(T::HistoricalAssociation),
    Column::ModuleId,
    Column::HasAttributes,
];

impl Column {
    /// Column name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConceptId => "concept_id",
            Self::Fsn => "fsn",
            Self::Active => "active",
            Self::DefinitionStatus => "definition_status",
            Self::Hierarchy => "hierarchy",
            Self::IntermediatePrimitive => "intermediate_primitive",
            Self::HasSdAncestor => "has_sd_ancestor",
            Self::HasSdDescendant => "has_sd_descendant",
            Self::ActiveIds(_) => "active_ids",
            Self::InactiveIds(_) => "inactive_ids",
            Self::ModuleId => "module_id",
            Self::HasAttributes => "has_attributes",
        }
    }

    fn write(&self, datum: &HistoricDatum, out: &mut String) {
        match self {
            Self::ConceptId => out.push_str(&datum.concept_id.to_string()),
            Self::Fsn => out.push_str(&datum.fsn),
            Self::Active => out.push_str(flag(datum.active)),
            Self::DefinitionStatus => out.push_str(datum.definition_status.code()),
            Self::Hierarchy => out.push_str(&datum.hierarchy.id().to_string()),
            Self::IntermediatePrimitive => out.push_str(flag(datum.is_intermediate_primitive)),
            Self::HasSdAncestor => out.push_str(flag(datum.has_sd_ancestor)),
            Self::HasSdDescendant => out.push_str(flag(datum.has_sd_descendant)),
            Self::ActiveIds(t) => write_ids(datum.ids(*t).map(ComponentIdSets::active), out),
            Self::InactiveIds(t) => write_ids(datum.ids(*t).map(ComponentIdSets::inactive), out),
            Self::ModuleId => out.push_str(&datum.module_id.to_string()),
            Self::HasAttributes => out.push_str(flag(datum.has_attributes)),
        }
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "Y"
    } else {
        "N"
    }
}

fn write_ids(ids: Option<&BTreeSet<ComponentId>>, out: &mut String) {
    let Some(ids) = ids else { return };
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            out.push(LIST_SEPARATOR);
        }
        out.push_str(id.as_str());
    }
}

/// Encode a datum as one line (without the trailing newline).
pub fn encode(datum: &HistoricDatum) -> Result<String, FormatError> {
    if datum.fsn.contains(&['\t', '\n', '\r'][..]) {
        return Err(FormatError::UnencodableFsn {
            concept_id: datum.concept_id,
        });
    }

    let mut line = String::with_capacity(128);
    for (i, column) in SCHEMA.iter().enumerate() {
        if i > 0 {
            line.push(FIELD_SEPARATOR);
        }
        column.write(datum, &mut line);
    }
    Ok(line)
}

/// Decoding state for one line.
struct LineReader<'a> {
    line_no: usize,
    raw: &'a str,
}

impl<'a> LineReader<'a> {
    fn invalid(&self, column: Column, value: &str) -> FormatError {
        FormatError::InvalidField {
            line: self.line_no,
            column: column.name(),
            value: value.to_string(),
            raw: self.raw.to_string(),
        }
    }

    fn sctid(&self, column: Column, value: &str) -> Result<SctId, FormatError> {
        value.parse().map_err(|_| self.invalid(column, value))
    }

    fn flag(&self, column: Column, value: &str) -> Result<bool, FormatError> {
        match value {
            "Y" => Ok(true),
            "N" => Ok(false),
            _ => Err(self.invalid(column, value)),
        }
    }

    fn ids(&self, column: Column, value: &str) -> Result<BTreeSet<ComponentId>, FormatError> {
        if value.is_empty() {
            return Ok(BTreeSet::new());
        }
        value
            .split(LIST_SEPARATOR)
            .map(|id| ComponentId::new(id).map_err(|_| self.invalid(column, value)))
            .collect()
    }
}

/// Decode one line. `line_no` is 1-based and only used for error reporting.
pub fn decode(line_no: usize, raw: &str) -> Result<HistoricDatum, FormatError> {
    let fields: Vec<&str> = raw.split(FIELD_SEPARATOR).collect();
    if fields.len() != COLUMN_COUNT {
        return Err(FormatError::ColumnCount {
            line: line_no,
            expected: COLUMN_COUNT,
            found: fields.len(),
            raw: raw.to_string(),
        });
    }

    let reader = LineReader { line_no, raw };
    let mut datum = HistoricDatum::new(SctId::new(0), String::new(), SctId::new(0));
    let mut active_ids: [BTreeSet<ComponentId>; 8] = Default::default();
    let mut inactive_ids: [BTreeSet<ComponentId>; 8] = Default::default();

    for (column, value) in SCHEMA.iter().copied().zip(fields) {
        match column {
            Column::ConceptId => datum.concept_id = reader.sctid(column, value)?,
            Column::Fsn => datum.fsn = value.to_string(),
            Column::Active => datum.active = reader.flag(column, value)?,
            Column::DefinitionStatus => {
                datum.definition_status = DefinitionStatus::from_code(value)
                    .ok_or_else(|| reader.invalid(column, value))?;
            }
            Column::Hierarchy => {
                datum.hierarchy = HierarchyBucket::from_id(reader.sctid(column, value)?);
            }
            Column::IntermediatePrimitive => {
                datum.is_intermediate_primitive = reader.flag(column, value)?;
            }
            Column::HasSdAncestor => datum.has_sd_ancestor = reader.flag(column, value)?,
            Column::HasSdDescendant => datum.has_sd_descendant = reader.flag(column, value)?,
            Column::ActiveIds(t) => {
                if let Some(i) = t.tracked_index() {
                    active_ids[i] = reader.ids(column, value)?;
                }
            }
            Column::InactiveIds(t) => {
                if let Some(i) = t.tracked_index() {
                    inactive_ids[i] = reader.ids(column, value)?;
                }
            }
            Column::ModuleId => datum.module_id = reader.sctid(column, value)?,
            Column::HasAttributes => datum.has_attributes = reader.flag(column, value)?,
        }
    }

    let lists = active_ids.into_iter().zip(inactive_ids);
    for (component_type, (active, inactive)) in ComponentType::TRACKED.into_iter().zip(lists) {
        let sets = ComponentIdSets::from_parts(active, inactive).map_err(|e| {
            FormatError::OverlappingIds {
                line: line_no,
                component_type,
                id: e.id,
                raw: raw.to_string(),
            }
        })?;
        datum.set_ids(component_type, sets);
    }

    Ok(datum)
}
