use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::kiosk::capture::Pin;

pub fn four_digit_pin(pin: &str, _ctx: &()) -> garde::Result {
    Pin::parse(pin)
        .map(|_| ())
        .map_err(|e| garde::Error::new(e.to_string()))
}

pub fn phone_characters(phone: &str, _ctx: &()) -> garde::Result {
    if phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')' | '.'))
    {
        Ok(())
    } else {
        Err(garde::Error::new("Phone number must be valid"))
    }
}

/// The employee create/update form. Sent to the backend in camelCase.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct EmployeeForm {
    #[garde(length(chars, min = 1, max = 50))]
    pub first_name: String,
    #[garde(length(chars, min = 1, max = 50))]
    pub last_name: String,
    #[garde(length(min = 10, max = 15), custom(phone_characters))]
    pub phone_number: String,
    #[garde(custom(four_digit_pin))]
    pub pin_code: String,
}

impl EmployeeForm {
    /// Trims surrounding whitespace from every field.
    pub fn normalized(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            pin_code: self.pin_code.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> EmployeeForm {
        EmployeeForm {
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            phone_number: "+33612345678".into(),
            pin_code: "4821".into(),
        }
    }

    #[test]
    fn accepts_a_complete_form() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn rejects_each_bad_field() {
        let cases = [
            EmployeeForm { first_name: String::new(), ..form() },
            EmployeeForm { last_name: "x".repeat(51), ..form() },
            EmployeeForm { phone_number: "123".into(), ..form() },
            EmployeeForm { phone_number: "0612345678abc".into(), ..form() },
            EmployeeForm { pin_code: "48211".into(), ..form() },
        ];
        for case in cases {
            assert!(case.validate().is_err(), "{:?}", case);
        }
    }

    #[test]
    fn serializes_camel_case_for_the_backend() {
        let json = serde_json::to_value(form()).unwrap();
        assert_eq!(json["firstName"], "Ana");
        assert_eq!(json["pinCode"], "4821");
    }

    #[test]
    fn normalization_trims() {
        let trimmed = EmployeeForm { first_name: "  Ana ".into(), ..form() }.normalized();
        assert_eq!(trimmed.first_name, "Ana");
    }
}
