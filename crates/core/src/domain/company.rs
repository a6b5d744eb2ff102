//! Tenant (company) entity.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of business a tenant runs; drives template selection and
/// default service-config behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyType {
    Restaurant,
    Clinic,
    Salon,
    Spa,
    Other,
}

/// Open/close time for a single weekday. `None` means closed that day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BusinessHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklyHours {
    pub monday: Option<BusinessHours>,
    pub tuesday: Option<BusinessHours>,
    pub wednesday: Option<BusinessHours>,
    pub thursday: Option<BusinessHours>,
    pub friday: Option<BusinessHours>,
    pub saturday: Option<BusinessHours>,
    pub sunday: Option<BusinessHours>,
}

impl WeeklyHours {
    pub fn for_day(&self, day: Weekday) -> Option<BusinessHours> {
        match day {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    pub fn is_open_at(&self, day: Weekday, time: NaiveTime) -> bool {
        self.for_day(day)
            .is_some_and(|h| time >= h.open && time <= h.close)
    }
}

/// Payment policy attached to a tenant: whether a deposit/prepayment is
/// required before a reservation is confirmed, and at what percentage of
/// the reservation total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPolicy {
    pub enabled: bool,
    /// 0..=100; 100 means full prepayment.
    pub percentage: u8,
}

impl Default for PaymentPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            percentage: 0,
        }
    }
}

/// Free-form tenant config. The named fields are read by control flow;
/// `extra` is round-tripped verbatim and never interpreted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyConfig {
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub default_reservation_noun: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub company_type: CompanyType,
    pub business_hours: WeeklyHours,
    pub payment_policy: PaymentPolicy,
    pub payment_provider_credentials: Option<String>,
    pub config: CompanyConfig,
    pub active: bool,
}

impl Company {
    pub fn reservation_noun_default(&self) -> &str {
        match self.company_type {
            CompanyType::Restaurant => "reserva",
            CompanyType::Clinic => "cita",
            CompanyType::Salon | CompanyType::Spa => "cita",
            CompanyType::Other => "reserva",
        }
    }
}
