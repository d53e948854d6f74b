use std::{collections::HashSet, fmt};

use tracing::{instrument, warn};

use crate::{AssetRef, Catalog, Method};

/// A broken catalog invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    NoExamples,
    EmptyExampleId { index: usize },
    DuplicateExample { id: String },
    MissingMethod { example: String, method: Method },
    DuplicateMethod { example: String, method: Method },
    /// Local reference that a browser would not fetch from under the site root.
    UnsafeAssetRef {
        example: String,
        method: Method,
        reference: AssetRef,
        reason: String,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoExamples => write!(f, "catalog has no examples"),
            Self::EmptyExampleId { index } => write!(f, "example #{index} has an empty id"),
            Self::DuplicateExample { id } => write!(f, "example {id} appears more than once"),
            Self::MissingMethod { example, method } => {
                write!(f, "example {example} has no {method} entry")
            }
            Self::DuplicateMethod { example, method } => {
                write!(f, "example {example} has more than one {method} entry")
            }
            Self::UnsafeAssetRef {
                example,
                method,
                reference,
                reason,
            } => write!(f, "example {example} {method} reference {reference} is unusable: {reason}"),
        }
    }
}

impl Catalog {
    /// Checks that every example carries exactly one entry per method.
    ///
    /// Returns every violation found, in catalog order.
    #[instrument(skip(self), level = "debug")]
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        if self.examples.is_empty() {
            violations.push(Violation::NoExamples);
        }

        let mut seen_ids = HashSet::new();
        for (index, example) in self.examples.iter().enumerate() {
            if example.id.trim().is_empty() {
                violations.push(Violation::EmptyExampleId { index });
            } else if !seen_ids.insert(example.id.as_str()) {
                violations.push(Violation::DuplicateExample {
                    id: example.id.clone(),
                });
            }

            for method in Method::ALL {
                let count = example.entries.iter().filter(|e| e.method == method).count();
                match count {
                    1 => {}
                    0 => violations.push(Violation::MissingMethod {
                        example: example.id.clone(),
                        method,
                    }),
                    _ => violations.push(Violation::DuplicateMethod {
                        example: example.id.clone(),
                        method,
                    }),
                }
            }

            for entry in &example.entries {
                for reference in [&entry.audio, &entry.spectrogram] {
                    if reference.is_remote() {
                        continue;
                    }
                    if let Err(reason) = reference.local_path() {
                        violations.push(Violation::UnsafeAssetRef {
                            example: example.id.clone(),
                            method: entry.method,
                            reference: reference.clone(),
                            reason,
                        });
                    }
                }
            }
        }

        for violation in &violations {
            warn!(%violation, "catalog violation");
        }
        violations
    }
}
