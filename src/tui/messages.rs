use crate::llm::ServiceError;
use crate::session::SessionError;

/// User-facing wording for a failed language-service call.
pub fn describe_service_error(err: &ServiceError) -> &'static str {
    match err {
        ServiceError::Timeout => "Request timed out. Please try again in a bit.",
        ServiceError::Unavailable | ServiceError::EmptyResponse => {
            "There is a problem with OpenAI. Please try again in a bit."
        }
        ServiceError::Connection => {
            "Failed to connect to OpenAI. Please check your network settings or firewall rules and try again."
        }
        ServiceError::InvalidRequest(_) => {
            "Request was invalid. Please try again with a different input."
        }
        ServiceError::Authentication => "API key invalid or expired. Please enter a valid API key.",
        ServiceError::Permission => {
            "Request not permitted. Please make sure your API key has permissions for the configured models."
        }
        ServiceError::RateLimited => {
            "Request exceeded rate limit. Please wait a minute and try again."
        }
        _ => "An error has occurred. Please try again.",
    }
}

pub fn describe(err: &SessionError) -> String {
    match err {
        SessionError::Service(service) => describe_service_error(service).to_string(),
        other => format!("An error has occurred: {other}."),
    }
}
