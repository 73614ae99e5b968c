use chrono::{DateTime, Local};

use crate::error::FetchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    /// Nothing has resolved yet
    Loading,
    Success,
    /// The most recent poll failed; the message is for display
    Error(String),
}

/// Latest known value of one polled endpoint.
///
/// `data` starts at `T::default()` and only changes on success, so a failed
/// poll leaves the last good value in place.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub data: T,
    pub status: QueryStatus,
    pub last_updated: Option<DateTime<Local>>,
}

impl<T: Default> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: T::default(),
            status: QueryStatus::Loading,
            last_updated: None,
        }
    }
}

impl<T> QueryState<T> {
    pub fn apply(&mut self, result: Result<T, FetchError>, now: DateTime<Local>) {
        match result {
            Ok(data) => {
                self.data = data;
                self.status = QueryStatus::Success;
                self.last_updated = Some(now);
            }
            Err(err) => {
                self.status = QueryStatus::Error(err.to_string());
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            QueryStatus::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> FetchError {
        FetchError::Status {
            url: "http://api/all".to_string(),
            status: reqwest::StatusCode::BAD_GATEWAY,
        }
    }

    #[test]
    fn starts_loading_with_default_data() {
        let state: QueryState<Vec<u32>> = QueryState::default();
        assert!(state.is_loading());
        assert!(state.data.is_empty());
        assert!(state.last_updated.is_none());
    }

    #[test]
    fn error_keeps_last_good_data() {
        let mut state: QueryState<Vec<u32>> = QueryState::default();
        let now = Local::now();

        state.apply(Ok(vec![1, 2]), now);
        state.apply(Err(failure()), now);

        assert_eq!(state.data, vec![1, 2]);
        assert_eq!(state.error(), Some("http://api/all returned status 502 Bad Gateway"));
        assert_eq!(state.last_updated, Some(now));
    }

    #[test]
    fn success_clears_error() {
        let mut state: QueryState<Vec<u32>> = QueryState::default();
        state.apply(Err(failure()), Local::now());
        assert!(state.error().is_some());
        assert!(state.data.is_empty());

        state.apply(Ok(vec![7]), Local::now());
        assert_eq!(state.status, QueryStatus::Success);
        assert_eq!(state.data, vec![7]);
    }
}
