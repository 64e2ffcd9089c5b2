use thiserror::Error;

pub type Result<T> = std::result::Result<T, GovernorError>;

#[derive(Error, Debug)]
pub enum GovernorError {
    #[error("daily request quota exhausted for {date}: {used}/{limit}")]
    DailyQuotaExhausted { date: String, used: u32, limit: u32 },
}
