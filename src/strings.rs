//! String Table
//!
//! Deduplicates display names and keys into small integer ids for the wire
//! format. Ids are assigned in first-seen order starting at 1; 0 stands for a
//! null string. The table lives as long as one inspector connection: every
//! message carries only the strings first seen since the previous message, so
//! a consumer rebuilds the same table by appending sections in order.

use crate::error::ProtocolError;
use crate::types::StringId;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct StringTable {
    ids: HashMap<String, StringId>,
    strings: Vec<String>,
    /// Number of strings already written into an emitted section
    flushed: usize,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `value`, returning its id. `None` maps to 0.
    pub fn get_id(&mut self, value: Option<&str>) -> StringId {
        let Some(value) = value else {
            return 0;
        };
        if let Some(id) = self.ids.get(value) {
            return *id;
        }
        self.strings.push(value.to_string());
        let id = self.strings.len() as StringId;
        self.ids.insert(value.to_string(), id);
        id
    }

    pub fn lookup(&self, id: StringId) -> Option<&str> {
        if id == 0 {
            return None;
        }
        self.strings.get(id as usize - 1).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Encode the strings added since the last call.
    ///
    /// Layout: `[word_count, (char_count, code points...)*]` where
    /// `word_count` excludes itself.
    pub fn take_section(&mut self) -> Vec<u32> {
        let mut section = vec![0];
        for value in &self.strings[self.flushed..] {
            let start = section.len();
            section.push(0);
            section.extend(value.chars().map(u32::from));
            section[start] = (section.len() - start - 1) as u32;
        }
        section[0] = (section.len() - 1) as u32;
        self.flushed = self.strings.len();
        section
    }

    /// Forget everything. Called when the inspector connection is replaced.
    pub fn reset(&mut self) {
        self.ids.clear();
        self.strings.clear();
        self.flushed = 0;
    }

    /// Append the strings of an encoded section (consumer side).
    ///
    /// Returns the number of words consumed, including the leading count.
    pub fn extend_from_section(&mut self, words: &[u32]) -> Result<usize, ProtocolError> {
        let total = *words.first().ok_or(ProtocolError::Truncated)? as usize;
        let body = words.get(1..1 + total).ok_or(ProtocolError::Truncated)?;
        let mut cursor = 0;
        while cursor < body.len() {
            let len = body[cursor] as usize;
            let chars = body
                .get(cursor + 1..cursor + 1 + len)
                .ok_or(ProtocolError::Truncated)?;
            let value = chars
                .iter()
                .map(|&cp| char::from_u32(cp).ok_or(ProtocolError::InvalidCodePoint(cp)))
                .collect::<Result<String, _>>()?;
            self.get_id(Some(&value));
            cursor += len + 1;
        }
        self.flushed = self.strings.len();
        Ok(total + 1)
    }
}
