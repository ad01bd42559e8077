use crate::api::handlers::contact::{ContactRequest, SolutionRequest};
use crate::db::models::application::ApplicationForm;
use crate::db::models::comment::CreateCommentRequest;
use crate::db::models::job_post::{CreateJobRequest, JobType, UpdateContactEmailRequest};
use crate::db::models::user::{
    AdminSetPasswordRequest, ChangePasswordRequest, LoginRequest, RegisterRequest,
};

use super::{email, max_chars, min_chars, Validate, ValidationError};

const INVALID_EMAIL: &str = "Invalid email address";
const NAME_TOO_SHORT: &str = "Name must be at least 2 characters";
const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";
const PASSWORDS_DIFFER: &str = "Passwords don't match";

impl Validate for CreateJobRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        min_chars("title", &self.title, 3, "Job title must be at least 3 characters")?;
        max_chars("title", &self.title, 200)?;
        min_chars(
            "description",
            &self.description,
            50,
            "Job description must be at least 50 characters (tell us more about the role)",
        )?;
        min_chars("location", &self.location, 2, "Please enter a job location")?;
        min_chars("category", &self.category, 2, "Please select a job category")?;
        if JobType::parse(self.job_type.trim()).is_none() {
            return Err(ValidationError::new(
                "invalid_enum_value",
                "jobType",
                "Invalid job type. Expected one of: FULL_TIME, PART_TIME, CONTRACT, FREELANCE, INTERNSHIP",
            ));
        }
        email("contactEmail", &self.contact_email, "Please enter a valid email address")?;
        Ok(())
    }
}

impl Validate for UpdateContactEmailRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        email("contactEmail", &self.contact_email, "Please enter a valid email address")
    }
}

impl Validate for ApplicationForm {
    fn validate(&self) -> Result<(), ValidationError> {
        min_chars("applicantName", &self.applicant_name, 2, NAME_TOO_SHORT)?;
        email("applicantEmail", &self.applicant_email, INVALID_EMAIL)?;
        min_chars("message", &self.message, 10, "Message must be at least 10 characters")?;
        max_chars("message", &self.message, 1000)?;
        Ok(())
    }
}

impl Validate for CreateCommentRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        min_chars("content", &self.content, 3, "Comment must be at least 3 characters")?;
        max_chars("Comment", &self.content, 500)?;
        min_chars("authorName", &self.author_name, 2, NAME_TOO_SHORT)?;
        email("authorEmail", &self.author_email, INVALID_EMAIL)?;
        Ok(())
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        email("email", &self.email, INVALID_EMAIL)?;
        if self.password.chars().count() < 6 {
            return Err(ValidationError::new("too_small", "password", PASSWORD_TOO_SHORT));
        }
        if let Some(name) = &self.name {
            min_chars("name", name, 2, NAME_TOO_SHORT)?;
        }
        Ok(())
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        email("email", &self.email, INVALID_EMAIL)?;
        if self.password.chars().count() < 6 {
            return Err(ValidationError::new("too_small", "password", PASSWORD_TOO_SHORT));
        }
        Ok(())
    }
}

impl Validate for ChangePasswordRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.current_password.chars().count() < 6 {
            return Err(ValidationError::new(
                "too_small",
                "currentPassword",
                "Current password is required",
            ));
        }
        if self.new_password.chars().count() < 6 {
            return Err(ValidationError::new(
                "too_small",
                "newPassword",
                "New password must be at least 6 characters",
            ));
        }
        if self.confirm_password.chars().count() < 6 {
            return Err(ValidationError::new(
                "too_small",
                "confirmPassword",
                "Password confirmation is required",
            ));
        }
        if self.new_password != self.confirm_password {
            return Err(ValidationError::new("custom", "confirmPassword", PASSWORDS_DIFFER));
        }
        Ok(())
    }
}

impl Validate for AdminSetPasswordRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.new_password.chars().count() < 6 {
            return Err(ValidationError::new(
                "too_small",
                "newPassword",
                "New password must be at least 6 characters",
            ));
        }
        if self.confirm_password.chars().count() < 6 {
            return Err(ValidationError::new(
                "too_small",
                "confirmPassword",
                "Password confirmation must be at least 6 characters",
            ));
        }
        if self.new_password != self.confirm_password {
            return Err(ValidationError::new("custom", "confirmPassword", PASSWORDS_DIFFER));
        }
        Ok(())
    }
}

impl Validate for ContactRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        min_chars("name", &self.name, 2, NAME_TOO_SHORT)?;
        email("email", &self.email, INVALID_EMAIL)?;
        min_chars("subject", &self.subject, 3, "Subject must be at least 3 characters")?;
        min_chars("message", &self.message, 10, "Message must be at least 10 characters")?;
        Ok(())
    }
}

impl Validate for SolutionRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        min_chars("type", &self.kind, 1, "Solution type is required")?;
        email("contact.email", &self.contact.email, INVALID_EMAIL)?;
        Ok(())
    }
}
