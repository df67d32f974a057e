use std::{fmt::Display, sync::OnceLock};

use chrono::{Datelike, NaiveDate, Utc};
use mongodb::bson::DateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const EMAIL_PATTERN: &str =
    r"(?i)^([a-z0-9_+]([a-z0-9_+.\-]*[a-z0-9_+])?)@([a-z0-9]+([\-\.]{1}[a-z0-9]+)*\.[a-z]{2,6})$";

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

/// Validated worker profile: everything the submitter controls.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct WorkerProfile {
    pub name: String,
    pub name_kana: String,
    pub name_romaji: String,
    pub birth_date: NaiveDate,
    pub gender: String,
    pub nationality: String,

    pub visa_type: String,
    pub visa_expiry: NaiveDate,
    pub passport_number: String,
    pub passport_expiry: NaiveDate,

    pub phone: String,
    pub email: Option<String>,

    pub postal_code: String,
    pub address: String,
    pub address_kana: String,
    pub building_name: Option<String>,
    pub building_name_kana: Option<String>,
    pub cho_me: Option<String>,

    pub emergency_name: String,
    pub emergency_relationship: String,
    pub emergency_phone: String,
    pub emergency_postal_code: Option<String>,
    pub emergency_address: Option<String>,
    pub emergency_address_kana: Option<String>,
    pub emergency_building_name: Option<String>,
    pub emergency_building_name_kana: Option<String>,
    pub emergency_cho_me: Option<String>,

    pub job_type: String,
    pub experience_years: u32,
    pub experience_months: u32,
    pub japanese_level: String,

    pub health_check_date: NaiveDate,
    pub health_check_expiry: NaiveDate,
    pub accident_insurance_expiry: NaiveDate,
    pub employment_insurance_expiry: NaiveDate,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Worker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<i64>,
    #[serde(flatten)]
    pub profile: WorkerProfile,
    pub age: i32,
    pub registration_date: DateTime,
    pub registered_by: String,
    pub last_modified_date: DateTime,
    pub modified_by: String,
}

/// Raw form submission. Every field is optional here so that a missing
/// field surfaces as a `ValidationError` rather than an extractor failure.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerForm {
    pub name: Option<String>,
    pub name_kana: Option<String>,
    pub name_romaji: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
    pub visa_type: Option<String>,
    pub visa_expiry: Option<String>,
    pub passport_number: Option<String>,
    pub passport_expiry: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub postal_code: Option<String>,
    pub address: Option<String>,
    pub address_kana: Option<String>,
    pub building_name: Option<String>,
    pub building_name_kana: Option<String>,
    pub cho_me: Option<String>,
    pub emergency_name: Option<String>,
    pub emergency_relationship: Option<String>,
    pub emergency_phone: Option<String>,
    pub emergency_postal_code: Option<String>,
    pub emergency_address: Option<String>,
    pub emergency_address_kana: Option<String>,
    pub emergency_building_name: Option<String>,
    pub emergency_building_name_kana: Option<String>,
    pub emergency_cho_me: Option<String>,
    pub job_type: Option<String>,
    pub experience_years: Option<String>,
    pub experience_months: Option<String>,
    pub japanese_level: Option<String>,
    pub health_check_date: Option<String>,
    pub health_check_expiry: Option<String>,
    pub accident_insurance_expiry: Option<String>,
    pub employment_insurance_expiry: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WorkerResponse {
    pub _id: i64,
    #[serde(flatten)]
    pub profile: WorkerProfile,
    pub age: i32,
    pub registration_date: chrono::DateTime<Utc>,
    pub registered_by: String,
    pub last_modified_date: chrono::DateTime<Utc>,
    pub modified_by: String,
    pub expired_documents: Vec<&'static str>,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct WorkerOperationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Whole years elapsed between `birth_date` and `today`.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

fn present(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ValidationError::Missing(field))
}

fn optional(
    value: Option<String>,
    field: &'static str,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match value.map(|value| value.trim().to_string()) {
        Some(value) if value.is_empty() => Ok(None),
        Some(value) if value.chars().count() > max => Err(ValidationError::TooLong { field, max }),
        value => Ok(value),
    }
}

fn required(
    value: Option<String>,
    field: &'static str,
    max: usize,
) -> Result<String, ValidationError> {
    optional(value, field, max)?.ok_or(ValidationError::Missing(field))
}

fn date(value: Option<String>, field: &'static str) -> Result<NaiveDate, ValidationError> {
    let value = present(value, field)?;
    NaiveDate::parse_from_str(&value, DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate { field, value })
}

fn number(value: Option<String>, field: &'static str) -> Result<u32, ValidationError> {
    let value = present(value, field)?;
    value
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidNumber { field, value })
}

fn email(value: Option<String>) -> Result<Option<String>, ValidationError> {
    let email = optional(value, "email", 120)?;
    if let Some(email) = &email {
        let regex = EMAIL_REGEX.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("EMAIL_PATTERN"));
        if !regex.is_match(email) {
            return Err(ValidationError::InvalidEmail(email.clone()));
        }
    }
    Ok(email)
}

impl WorkerForm {
    /// Checks every field and converts the submission into a typed profile.
    /// The first failing field aborts the conversion.
    pub fn into_profile(self, today: NaiveDate) -> Result<WorkerProfile, ValidationError> {
        let birth_date = date(self.birth_date, "birth_date")?;
        if birth_date > today {
            return Err(ValidationError::FutureBirthDate(
                birth_date.format(DATE_FORMAT).to_string(),
            ));
        }

        Ok(WorkerProfile {
            name: required(self.name, "name", 100)?,
            name_kana: required(self.name_kana, "name_kana", 100)?,
            name_romaji: required(self.name_romaji, "name_romaji", 100)?,
            birth_date,
            gender: required(self.gender, "gender", 10)?,
            nationality: required(self.nationality, "nationality", 50)?,
            visa_type: required(self.visa_type, "visa_type", 50)?,
            visa_expiry: date(self.visa_expiry, "visa_expiry")?,
            passport_number: required(self.passport_number, "passport_number", 50)?,
            passport_expiry: date(self.passport_expiry, "passport_expiry")?,
            phone: required(self.phone, "phone", 20)?,
            email: email(self.email)?,
            postal_code: required(self.postal_code, "postal_code", 8)?,
            address: required(self.address, "address", 200)?,
            address_kana: required(self.address_kana, "address_kana", 200)?,
            building_name: optional(self.building_name, "building_name", 100)?,
            building_name_kana: optional(self.building_name_kana, "building_name_kana", 100)?,
            cho_me: optional(self.cho_me, "cho_me", 50)?,
            emergency_name: required(self.emergency_name, "emergency_name", 100)?,
            emergency_relationship: required(
                self.emergency_relationship,
                "emergency_relationship",
                50,
            )?,
            emergency_phone: required(self.emergency_phone, "emergency_phone", 20)?,
            emergency_postal_code: optional(
                self.emergency_postal_code,
                "emergency_postal_code",
                8,
            )?,
            emergency_address: optional(self.emergency_address, "emergency_address", 200)?,
            emergency_address_kana: optional(
                self.emergency_address_kana,
                "emergency_address_kana",
                200,
            )?,
            emergency_building_name: optional(
                self.emergency_building_name,
                "emergency_building_name",
                100,
            )?,
            emergency_building_name_kana: optional(
                self.emergency_building_name_kana,
                "emergency_building_name_kana",
                100,
            )?,
            emergency_cho_me: optional(self.emergency_cho_me, "emergency_cho_me", 50)?,
            job_type: required(self.job_type, "job_type", 50)?,
            experience_years: number(self.experience_years, "experience_years")?,
            experience_months: number(self.experience_months, "experience_months")?,
            japanese_level: required(self.japanese_level, "japanese_level", 20)?,
            health_check_date: date(self.health_check_date, "health_check_date")?,
            health_check_expiry: date(self.health_check_expiry, "health_check_expiry")?,
            accident_insurance_expiry: date(
                self.accident_insurance_expiry,
                "accident_insurance_expiry",
            )?,
            employment_insurance_expiry: date(
                self.employment_insurance_expiry,
                "employment_insurance_expiry",
            )?,
        })
    }
}

impl WorkerProfile {
    pub fn expiry_dates(&self) -> [(&'static str, NaiveDate); 5] {
        [
            ("visa_expiry", self.visa_expiry),
            ("passport_expiry", self.passport_expiry),
            ("health_check_expiry", self.health_check_expiry),
            ("accident_insurance_expiry", self.accident_insurance_expiry),
            ("employment_insurance_expiry", self.employment_insurance_expiry),
        ]
    }
}

impl Worker {
    pub fn new_registration(
        profile: WorkerProfile,
        today: NaiveDate,
        actor: &str,
        now: DateTime,
    ) -> Self {
        Worker {
            _id: None,
            age: age_on(profile.birth_date, today),
            profile,
            registration_date: now,
            registered_by: actor.to_string(),
            last_modified_date: now,
            modified_by: actor.to_string(),
        }
    }
    /// Builds the replacement for `self`, keeping its identifier and registration audit.
    pub fn revised(
        &self,
        profile: WorkerProfile,
        today: NaiveDate,
        actor: &str,
        now: DateTime,
    ) -> Self {
        Worker {
            _id: self._id,
            age: age_on(profile.birth_date, today),
            profile,
            registration_date: self.registration_date,
            registered_by: self.registered_by.clone(),
            last_modified_date: now,
            modified_by: actor.to_string(),
        }
    }
    pub fn expired_documents(&self, today: NaiveDate) -> Vec<&'static str> {
        self.profile
            .expiry_dates()
            .into_iter()
            .filter(|(_, expiry)| *expiry < today)
            .map(|(field, _)| field)
            .collect()
    }
    pub fn into_response(self, today: NaiveDate) -> WorkerResponse {
        let expired_documents = self.expired_documents(today);
        WorkerResponse {
            _id: self._id.unwrap_or_default(),
            profile: self.profile,
            age: self.age,
            registration_date: to_utc(self.registration_date),
            registered_by: self.registered_by,
            last_modified_date: to_utc(self.last_modified_date),
            modified_by: self.modified_by,
            expired_documents,
        }
    }
}

impl WorkerOperationResponse {
    pub fn succeeded(id: i64) -> Self {
        WorkerOperationResponse {
            success: true,
            id: Some(id),
            error: None,
        }
    }
    pub fn failed(error: &impl Display) -> Self {
        WorkerOperationResponse {
            success: false,
            id: None,
            error: Some(error.to_string()),
        }
    }
}

pub fn to_bson_datetime(now: chrono::DateTime<Utc>) -> DateTime {
    DateTime::from_millis(now.timestamp_millis())
}

fn to_utc(value: DateTime) -> chrono::DateTime<Utc> {
    chrono::DateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or_default()
}

#[cfg(test)]
pub(crate) fn sample_form() -> WorkerForm {
    let text = |value: &str| Some(value.to_string());
    WorkerForm {
        name: text("阮文安"),
        name_kana: text("グエン ヴァン アン"),
        name_romaji: text("NGUYEN VAN AN"),
        birth_date: text("2000-06-15"),
        gender: text("男性"),
        nationality: text("ベトナム"),
        visa_type: text("特定技能1号"),
        visa_expiry: text("2026-03-31"),
        passport_number: text("C1234567"),
        passport_expiry: text("2030-01-09"),
        phone: text("090-1234-5678"),
        email: text("an.nguyen@example.com"),
        postal_code: text("160-0022"),
        address: text("東京都新宿区新宿"),
        address_kana: text("トウキョウト シンジュクク シンジュク"),
        building_name: text("新宿ハイツ"),
        building_name_kana: text("シンジュクハイツ"),
        cho_me: text("3-1-13"),
        emergency_name: text("Nguyen Thi Binh"),
        emergency_relationship: text("母"),
        emergency_phone: text("080-9876-5432"),
        emergency_postal_code: None,
        emergency_address: text("Ha Noi, Viet Nam"),
        emergency_address_kana: None,
        emergency_building_name: Some(String::new()),
        emergency_building_name_kana: None,
        emergency_cho_me: None,
        job_type: text("建設"),
        experience_years: text("3"),
        experience_months: text("6"),
        japanese_level: text("N3"),
        health_check_date: text("2024-04-01"),
        health_check_expiry: text("2025-03-31"),
        accident_insurance_expiry: text("2025-09-30"),
        employment_insurance_expiry: text("2025-09-30"),
    }
}
