use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An uploaded image stored in redb, backed by a file in the image directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    /// Original filename from the upload, kept for admin display
    pub label: String,
    /// Generated stored filename (`<uuid>.<ext>`), unique
    pub name: String,
    /// md5 of the file content, hex encoded
    pub hash: String,
    pub byte_size: u64,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    /// Free-form grouping tag ("emote", "flair", ...)
    #[serde(default)]
    pub tag: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A chat emote referencing an uploaded image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmoteRecord {
    pub id: String,
    /// The code typed in chat
    pub prefix: String,
    pub image_id: String,
    pub created_at: DateTime<Utc>,
}

/// A flair feature referencing an uploaded icon image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub id: String,
    pub label: String,
    pub image_id: String,
    pub created_at: DateTime<Utc>,
}

/// A site account. Roles are owned by the upstream auth subsystem and are
/// not persisted here; they arrive with the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub name_changed_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriptionStatus {
    New,
    Active,
    Expired,
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionStatus::New => write!(f, "NEW"),
            SubscriptionStatus::Active => write!(f, "ACTIVE"),
            SubscriptionStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    Month,
    Year,
}

/// A purchasable subscription tier. The catalog is static; records refer to
/// entries by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubscriptionType {
    pub id: &'static str,
    pub label: &'static str,
    pub billing_frequency: u32,
    pub billing_period: BillingPeriod,
}

pub const SUBSCRIPTION_TYPES: &[SubscriptionType] = &[
    SubscriptionType {
        id: "monthly",
        label: "Monthly",
        billing_frequency: 1,
        billing_period: BillingPeriod::Month,
    },
    SubscriptionType {
        id: "quarterly",
        label: "Quarterly",
        billing_frequency: 3,
        billing_period: BillingPeriod::Month,
    },
    SubscriptionType {
        id: "annual",
        label: "Annual",
        billing_frequency: 1,
        billing_period: BillingPeriod::Year,
    },
];

impl SubscriptionType {
    pub fn find(id: &str) -> Option<&'static SubscriptionType> {
        SUBSCRIPTION_TYPES.iter().find(|t| t.id == id)
    }

    /// Length of one billing period in calendar months.
    pub fn billing_months(&self) -> u32 {
        match self.billing_period {
            BillingPeriod::Month => self.billing_frequency,
            BillingPeriod::Year => self.billing_frequency * 12,
        }
    }
}

/// A user's subscription. Status moves NEW -> ACTIVE on checkout
/// confirmation, ACTIVE -> EXPIRED (or rolls forward, for recurring ones)
/// via the expiry sweep. NEW rows left over from abandoned checkouts are
/// purged after an hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: String,
    pub user_id: String,
    pub subscription_type: String,
    pub status: SubscriptionStatus,
    /// Whether the upstream biller holds an active payment profile
    #[serde(default)]
    pub recurring: bool,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRecord {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.end_date > now
    }
}
