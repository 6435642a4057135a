//! Rules document interpretation.
//!
//! The interpreter consumes already tokenized declaration events and never
//! looks at document syntax. `read_rules_document` is the XML front end: it
//! tokenizes a file with `quick-xml` and feeds the events through.
//!
//! ```xml
//! <copy>
//!   <include table=".*"/>
//!   <exclude table=".*History"/>
//! </copy>
//! ```

use crate::error::CopyError;
use crate::rules::RuleSet;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::path::Path;
use tracing::trace;

/// Element name of an include declaration.
pub const INCLUDE_TAG: &str = "include";
/// Element name of an exclude declaration.
pub const EXCLUDE_TAG: &str = "exclude";
/// Attribute carrying the table selector.
pub const TABLE_ATTRIBUTE: &str = "table";

/// One element of a rules document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationEvent {
    /// Element name
    pub tag: String,
    /// Value of the `table` attribute, if present
    pub table: Option<String>,
}

impl DeclarationEvent {
    /// Creates an event.
    pub fn new(tag: impl Into<String>, table: Option<&str>) -> Self {
        Self {
            tag: tag.into(),
            table: table.map(str::to_string),
        }
    }

    /// Shorthand for an include declaration.
    pub fn include(table: &str) -> Self {
        Self::new(INCLUDE_TAG, Some(table))
    }

    /// Shorthand for an exclude declaration.
    pub fn exclude(table: &str) -> Self {
        Self::new(EXCLUDE_TAG, Some(table))
    }
}

/// Populates a [`RuleSet`] from declaration events.
///
/// Declarations with a missing or blank `table` are skipped and any tag other
/// than `include`/`exclude` is ignored.
#[derive(Debug)]
pub struct ConfigDocumentInterpreter<'a> {
    rules: &'a mut RuleSet,
}

impl<'a> ConfigDocumentInterpreter<'a> {
    /// Creates an interpreter writing into `rules`.
    pub const fn new(rules: &'a mut RuleSet) -> Self {
        Self { rules }
    }

    /// Applies one declaration.
    ///
    /// # Errors
    /// Returns `InvalidRulePattern` if the table selector is not a valid
    /// regular expression.
    pub fn interpret(&mut self, event: &DeclarationEvent) -> crate::Result<()> {
        let Some(table) = event.table.as_deref() else {
            return Ok(());
        };

        match event.tag.as_str() {
            INCLUDE_TAG => {
                if self.rules.include_table(table)? {
                    trace!("Include table {}", table.trim());
                }
            }
            EXCLUDE_TAG => {
                if self.rules.exclude_table(table)? {
                    trace!("Exclude table {}", table.trim());
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Applies a sequence of declarations in order.
    ///
    /// # Errors
    /// Stops at the first invalid table selector.
    pub fn interpret_all<'e, I>(&mut self, events: I) -> crate::Result<()>
    where
        I: IntoIterator<Item = &'e DeclarationEvent>,
    {
        for event in events {
            self.interpret(event)?;
        }
        Ok(())
    }
}

/// Tokenizes an XML rules document into declaration events.
///
/// Every start or empty element becomes one event, whatever its nesting.
///
/// # Errors
/// Returns `ConfigDocument` for malformed XML or attributes.
pub fn parse_declarations(xml: &str) -> crate::Result<Vec<DeclarationEvent>> {
    let mut reader = Reader::from_str(xml);
    let mut events = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element) | Event::Empty(element)) => {
                events.push(declaration_from(&element)?);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(CopyError::ConfigDocument {
                    context: format!(
                        "malformed XML at byte {}: {}",
                        reader.error_position(),
                        e
                    ),
                });
            }
        }
    }

    Ok(events)
}

fn declaration_from(element: &BytesStart<'_>) -> crate::Result<DeclarationEvent> {
    let tag = String::from_utf8_lossy(element.name().as_ref()).into_owned();
    let mut table = None;

    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| CopyError::ConfigDocument {
            context: format!("invalid attribute on <{}>: {}", tag, e),
        })?;
        if attribute.key.as_ref() == TABLE_ATTRIBUTE.as_bytes() {
            let value = attribute
                .unescape_value()
                .map_err(|e| CopyError::ConfigDocument {
                    context: format!("invalid table attribute on <{}>: {}", tag, e),
                })?;
            table = Some(value.into_owned());
        }
    }

    Ok(DeclarationEvent { tag, table })
}

/// Reads an XML rules document into a fresh rule set.
///
/// The result starts empty: a document with no include declarations selects
/// no tables.
///
/// # Errors
/// Returns `Io` if the file cannot be read, `ConfigDocument` for malformed
/// XML and `InvalidRulePattern` for an invalid selector.
pub fn read_rules_document(path: &Path) -> crate::Result<RuleSet> {
    let xml = std::fs::read_to_string(path)
        .map_err(|e| CopyError::io(format!("Failed to read rules document {}", path.display()), e))?;

    let events = parse_declarations(&xml).map_err(|e| match e {
        CopyError::ConfigDocument { context } => CopyError::ConfigDocument {
            context: format!("{}: {}", path.display(), context),
        },
        other => other,
    })?;

    let mut rules = RuleSet::new();
    ConfigDocumentInterpreter::new(&mut rules).interpret_all(&events)?;
    Ok(rules)
}
