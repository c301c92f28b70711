use crate::error::{RegisterError, Result};
use crate::sources::dpma::file_number::derive_file_reference;
use crate::sources::dpma::session::RegistrySearchSession;
use crate::types::ResolvedReference;

/// Reference class the register uses for alternate records of German numbers.
const EXCLUDED_DE_PREFIX: char = 'E';
const PCT_LABEL_PREFIX: &str = "PCT";

/// Maps document numbers to register file references.
pub struct FileReferenceResolver {
    session: RegistrySearchSession,
}

impl FileReferenceResolver {
    pub fn new(session: RegistrySearchSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &RegistrySearchSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut RegistrySearchSession {
        &mut self.session
    }

    pub async fn resolve(&mut self, document_number: &str) -> Result<ResolvedReference> {
        let number = document_number.trim().to_uppercase();

        // Computable references skip the search entirely.
        if let Some(reference) = derive_file_reference(&number) {
            tracing::info!(document_number = %number, reference = %reference, "Derived file reference");
            return Ok(ResolvedReference::new(reference, Some(number)));
        }

        let candidates = self.session.search(&number).await?;
        let resolved = disambiguate(&number, candidates);
        match &resolved {
            Ok(result) => {
                tracing::info!(document_number = %number, reference = %result.reference, "Resolved file reference")
            }
            Err(_) => {
                tracing::warn!(document_number = %number, "Could not resolve file reference")
            }
        }
        resolved
    }
}

/// Picks one candidate out of a search result.
///
/// Several candidates are filtered by jurisdiction. If more than one
/// remains, the first one in register order is taken and the ambiguity is
/// logged.
pub fn disambiguate(
    document_number: &str,
    mut candidates: Vec<ResolvedReference>,
) -> Result<ResolvedReference> {
    if candidates.len() > 1 {
        if document_number.starts_with("DE") {
            candidates.retain(|c| !c.reference.starts_with(EXCLUDED_DE_PREFIX));
        }
        if document_number.starts_with("WO") {
            candidates.retain(|c| {
                c.label
                    .as_deref()
                    .is_some_and(|label| label.starts_with(PCT_LABEL_PREFIX))
            });
        }
    }

    if candidates.len() > 1 {
        let listed = candidates
            .iter()
            .map(|c| c.reference.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        tracing::warn!(
            document_number,
            count = candidates.len(),
            candidates = %listed,
            "Search result is ambiguous, using first candidate"
        );
    }

    let Some(first) = candidates.into_iter().next() else {
        tracing::warn!(document_number, "Search result is empty");
        return Err(RegisterError::NotFound(document_number.to_string()));
    };
    Ok(first)
}
