// Copyright (c) 2020 Google LLC All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt;

/// How serious a [`Problem`] is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// The bind cannot succeed.
    Fatal,
    /// Extra information for the user, such as a hint.
    Informational,
}

/// A single diagnostic produced while binding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Problem {
    /// How serious the problem is.
    pub severity: Severity,
    /// The text to show to the user.
    pub message: String,
}

impl Problem {
    /// Whether this problem makes the bind fail.
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

/// An ordered list of diagnostics. Any fatal entry means the bind failed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Problems {
    entries: Vec<Problem>,
}

impl Problems {
    /// Record a problem that makes the bind fail.
    pub fn add_fatal(&mut self, message: impl Into<String>) {
        self.entries.push(Problem { severity: Severity::Fatal, message: message.into() });
    }

    /// Record a problem that only informs the user.
    pub fn add_informational(&mut self, message: impl Into<String>) {
        self.entries.push(Problem { severity: Severity::Informational, message: message.into() });
    }

    /// Whether any fatal problem has been recorded.
    pub fn has_fatal(&self) -> bool {
        self.entries.iter().any(Problem::is_fatal)
    }

    /// Iterate all problems in the order they were recorded.
    pub fn iter(&self) -> std::slice::Iter<'_, Problem> {
        self.entries.iter()
    }

    /// Iterate the messages of fatal problems.
    pub fn fatal_messages(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter(|p| p.is_fatal()).map(|p| p.message.as_str())
    }

    /// Whether any problem carries exactly `message`.
    pub fn contains(&self, message: &str) -> bool {
        self.entries.iter().any(|p| p.message == message)
    }

    /// The number of recorded problems.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no problem has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Problems {
    type Item = &'a Problem;
    type IntoIter = std::slice::Iter<'a, Problem>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Problems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, problem) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(&problem.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn informational_problems_are_not_fatal() {
        let mut problems = Problems::default();
        problems.add_informational("hint");
        assert!(!problems.has_fatal());
        problems.add_fatal("broken");
        assert!(problems.has_fatal());
        assert_eq!(problems.fatal_messages().collect::<Vec<_>>(), ["broken"]);
        assert_eq!(problems.to_string(), "hint\nbroken");
    }
}
