use hyperdex_error::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("predicate names no subspace of this space")]
    NoCandidateSubspace,
}

impl From<SearchError> for StatusCode {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::NoCandidateSubspace => StatusCode::BadSearch,
        }
    }
}
