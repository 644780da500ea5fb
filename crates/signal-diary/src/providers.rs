//! Static network provider directory, regions, and per-region label sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entry::IssueType;

/// Provider key meaning "not in the directory, see the custom name".
pub const OTHER_PROVIDER: &str = "other";

/// Region tag selecting a label set and a slice of the provider directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Region {
    /// United States.
    #[default]
    #[serde(rename = "US", alias = "us", alias = "en-US")]
    Us,
    /// United Kingdom.
    #[serde(rename = "GB", alias = "gb", alias = "UK", alias = "en-GB")]
    Gb,
}

impl Region {
    /// All supported regions.
    #[must_use]
    pub fn all() -> &'static [Region] {
        &[Self::Us, Self::Gb]
    }

    /// The label set used when rendering for this region.
    #[must_use]
    pub fn labels(self) -> &'static LabelSet {
        match self {
            Self::Us => &US_LABELS,
            Self::Gb => &GB_LABELS,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Us => f.write_str("US"),
            Self::Gb => f.write_str("GB"),
        }
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "US" | "EN-US" => Ok(Self::Us),
            "GB" | "UK" | "EN-GB" => Ok(Self::Gb),
            other => Err(format!("unknown region '{other}' (expected US or GB)")),
        }
    }
}

/// One row of the provider directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provider {
    /// Directory key stored in the profile.
    pub key: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Customer support email, empty when the carrier publishes none.
    pub support_email: &'static str,
    /// Customer support phone number.
    pub support_phone: &'static str,
    /// Region the carrier operates in.
    pub region: Region,
}

const fn us(
    key: &'static str,
    name: &'static str,
    support_email: &'static str,
    support_phone: &'static str,
) -> Provider {
    Provider {
        key,
        name,
        support_email,
        support_phone,
        region: Region::Us,
    }
}

const fn gb(key: &'static str, name: &'static str, support_phone: &'static str) -> Provider {
    Provider {
        key,
        name,
        support_email: "",
        support_phone,
        region: Region::Gb,
    }
}

/// The provider directory.
pub static DIRECTORY: &[Provider] = &[
    us("verizon", "Verizon", "support@verizon.com", "1-800-922-0204"),
    us("att", "AT&T", "support@att.com", "1-800-331-0500"),
    us("tmobile", "T-Mobile", "support@t-mobile.com", "1-877-746-0909"),
    us("sprint", "Sprint", "support@sprint.com", "1-888-211-4727"),
    us("uscellular", "U.S. Cellular", "support@uscellular.com", "1-888-944-9400"),
    us("cricket", "Cricket Wireless", "support@cricketwireless.com", "1-800-274-2538"),
    us("boost", "Boost Mobile", "support@boostmobile.com", "1-833-502-6678"),
    us("metro", "Metro by T-Mobile", "support@metropcs.com", "1-888-863-8768"),
    us("straight-talk", "Straight Talk", "support@straighttalk.com", "1-877-430-2355"),
    us("tracfone", "TracFone", "support@tracfone.com", "1-800-867-7183"),
    us("consumer-cellular", "Consumer Cellular", "support@consumercellular.com", "1-800-686-4460"),
    us("xfinity", "Xfinity Mobile", "support@xfinity.com", "1-888-936-4968"),
    us("visible", "Visible", "support@visible.com", "1-888-294-6804"),
    us("mint", "Mint Mobile", "support@mintmobile.com", "1-800-683-7392"),
    gb("ee", "EE", "150"),
    gb("vodafone-uk", "Vodafone", "191"),
    gb("o2", "O2", "202"),
    gb("three", "Three", "333"),
];

/// Directory rows for a region, or the whole directory when `region` is `None`.
pub fn providers_for(region: Option<Region>) -> impl Iterator<Item = &'static Provider> {
    DIRECTORY
        .iter()
        .filter(move |p| region.map_or(true, |r| p.region == r))
}

/// Look up a directory row by key, restricted to `region` when given.
#[must_use]
pub fn lookup(key: &str, region: Option<Region>) -> Option<&'static Provider> {
    let key = key.trim();
    providers_for(region).find(|p| p.key.eq_ignore_ascii_case(key))
}

/// Contact details for the user's carrier, as shown in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    /// Display name.
    pub name: String,
    /// Support email, if known.
    pub support_email: Option<String>,
    /// Support phone, if known.
    pub support_phone: Option<String>,
}

impl ProviderInfo {
    /// A provider the directory doesn't know, with only a name.
    #[must_use]
    pub fn custom(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            support_email: None,
            support_phone: None,
        }
    }
}

impl From<&Provider> for ProviderInfo {
    fn from(p: &Provider) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            name: p.name.to_string(),
            support_email: non_empty(p.support_email),
            support_phone: non_empty(p.support_phone),
        }
    }
}

/// Region-specific wording and date formats for exported documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSet {
    /// `chrono` format for the date column.
    pub date_format: &'static str,
    /// `chrono` format for the time column.
    pub time_format: &'static str,
    /// What the carrier is called.
    pub provider_label: &'static str,
    /// Label overriding [`IssueType::MessageFailed`]'s canonical label.
    pub message_failed_label: &'static str,
}

impl LabelSet {
    /// Label for an issue type in this region.
    #[must_use]
    pub fn issue_label(&self, issue_type: IssueType) -> &'static str {
        match issue_type {
            IssueType::MessageFailed => self.message_failed_label,
            other => other.label(),
        }
    }
}

static US_LABELS: LabelSet = LabelSet {
    date_format: "%m/%d/%Y",
    time_format: "%I:%M %p",
    provider_label: "Network Provider",
    message_failed_label: "Message Didn't Send",
};

static GB_LABELS: LabelSet = LabelSet {
    date_format: "%d/%m/%Y",
    time_format: "%H:%M",
    provider_label: "Network Operator",
    message_failed_label: "Text Didn't Send",
};
