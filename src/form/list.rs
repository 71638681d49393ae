//! Multi-value list collection, terminated by the skip sentinel.

use crate::error::Rejected;

use super::schema::ListVariant;
use super::session::Answer;
use super::validators::{format_person_name, is_skip_sentinel};

/// Result of feeding one list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStep {
    /// Item buffered; holds the new buffer length.
    Added(usize),
    /// Sentinel received; the value to store.
    Finished(Answer),
}

/// Accumulates validated items for one list field.
pub struct ListCollector {
    variant: ListVariant,
}

impl ListCollector {
    pub fn new(variant: ListVariant) -> Self {
        Self { variant }
    }

    /// Prompt shown after an item was buffered.
    pub fn next_item_prompt(&self) -> &'static str {
        match self.variant {
            ListVariant::Clauses => "Добавлено. Следующий пункт или «-» для завершения:",
            ListVariant::Names => "Добавлено. Введите следующее ФИО или «-» если больше никого.",
        }
    }

    /// Buffer an item, or finish on the sentinel.
    ///
    /// A rejected name leaves the buffer untouched.
    pub fn accept(&self, buffer: &mut Vec<String>, raw: &str) -> Result<ListStep, Rejected> {
        if is_skip_sentinel(raw) {
            return Ok(ListStep::Finished(self.finish(std::mem::take(buffer))));
        }
        let item = match self.variant {
            ListVariant::Clauses => {
                // one clause per entry: inner line breaks must not start new items
                let s = raw.split_whitespace().collect::<Vec<_>>().join(" ");
                if s.is_empty() {
                    return Err(Rejected::new("Введите текст пункта или «-» для завершения."));
                }
                s
            }
            ListVariant::Names => format_person_name(raw)?,
        };
        buffer.push(item);
        Ok(ListStep::Added(buffer.len()))
    }

    /// Drop the last buffered item. Returns `false` when the buffer is empty.
    pub fn revert(&self, buffer: &mut Vec<String>) -> bool {
        buffer.pop().is_some()
    }

    fn finish(&self, items: Vec<String>) -> Answer {
        if items.is_empty() {
            return Answer::Blank;
        }
        match self.variant {
            ListVariant::Clauses => Answer::Text(number_items(&items)),
            ListVariant::Names => Answer::List(items),
        }
    }
}

/// `1. first\n2. second`
pub fn number_items(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {item}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
