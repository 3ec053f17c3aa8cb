use std::fmt;

/// The remote operation a request belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchCompanies,
    FetchCompany,
    FetchCreditScore,
    FetchScoreHistory,
    FetchNews,
    AddCompany,
}

impl Operation {
    pub fn description(self) -> &'static str {
        match self {
            Operation::FetchCompanies => "Failed to fetch companies",
            Operation::FetchCompany => "Failed to fetch company",
            Operation::FetchCreditScore => "Failed to fetch credit score",
            Operation::FetchScoreHistory => "Failed to fetch score history",
            Operation::FetchNews => "Failed to fetch news",
            Operation::AddCompany => "Failed to add company",
        }
    }
}

/// Any failed call against the scoring API: transport error, non-2xx status or an
/// undecodable body. Status codes are kept for logging only; callers treat all the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFailed {
    pub operation: Operation,
    pub status: Option<u16>,
    pub detail: String,
}

impl RequestFailed {
    pub fn new(operation: Operation, detail: impl Into<String>) -> Self {
        Self {
            operation,
            status: None,
            detail: detail.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl fmt::Display for RequestFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let detail = self.detail.trim();
        if detail.is_empty() {
            write!(f, "{}", self.operation.description())
        } else {
            write!(f, "{}: {}", self.operation.description(), detail)
        }
    }
}

impl std::error::Error for RequestFailed {}
