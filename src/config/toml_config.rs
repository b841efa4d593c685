use crate::core::ids::{BookingIdPolicy, DEFAULT_BOOKING_ID_BASE};
use crate::domain::source::SourceLocation;
use crate::utils::error::{Result, SchedError};
use crate::utils::validation::{self, Validate};
use chrono::{FixedOffset, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BASE_URL: &str =
    "https://raw.githubusercontent.com/smart-on-fhir/smart-scheduling-links/master/examples/";

const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub generator: GeneratorSettings,
    pub source: SourceSettings,
    pub ids: IdSettings,
    pub slots: SlotSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub name: String,
    /// Prefix for every URL in the manifest; must end with `/`.
    pub base_url: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Fixed offset all slot timestamps are expressed in, e.g. `-05:00`.
    pub utc_offset: String,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            name: "smart-scheduling-examples".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            start_date: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2021, 3, 31).unwrap_or_default(),
            utc_offset: "-05:00".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    #[default]
    Builtin,
    Availability,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub kind: SourceKind,
    /// Availability file, required when `kind = "availability"`.
    pub path: Option<String>,
    /// Keep only the first N locations.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdStrategy {
    /// One counter shared by locations, schedules and slots.
    #[default]
    Sequential,
    /// Address hash for locations; schedule and slot ids built from it.
    Derived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdSettings {
    pub strategy: IdStrategy,
    pub schedule_prefix: String,
    pub booking_ids: BookingIdPolicy,
    pub booking_id_base: u64,
}

impl Default for IdSettings {
    fn default() -> Self {
        Self {
            strategy: IdStrategy::Sequential,
            schedule_prefix: "c19".to_string(),
            booking_ids: BookingIdPolicy::Sequential,
            booking_id_base: DEFAULT_BOOKING_ID_BASE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Granularity {
    /// One slot per day spanning the open window, with a capacity.
    #[default]
    Coarse,
    /// Back-to-back appointments of `visit_minutes` each.
    Fine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotSettings {
    pub granularity: Granularity,
    pub visit_minutes: u32,
    pub slots_per_day: u32,
    /// Minutes after local midnight.
    pub open_offset_minutes: u32,
    pub close_offset_minutes: u32,
    pub capacity: u32,
    /// When set, every window becomes a free slot (capacity - booked) and a busy slot (booked).
    pub booked: Option<u32>,
    pub booking_link: bool,
    pub booking_link_base: String,
    pub booking_phone: bool,
}

impl Default for SlotSettings {
    fn default() -> Self {
        Self {
            granularity: Granularity::Coarse,
            visit_minutes: 20,
            slots_per_day: 30,
            open_offset_minutes: 9 * 60,
            close_offset_minutes: 18 * 60,
            capacity: 100,
            booked: None,
            booking_link: true,
            booking_link_base: "https://ehr-portal.example.org/bookings?slot=".to_string(),
            booking_phone: true,
        }
    }
}

impl SlotSettings {
    /// Number of time windows produced per schedule per day.
    pub fn windows_per_day(&self) -> usize {
        match self.granularity {
            Granularity::Coarse => 1,
            Granularity::Fine => self.slots_per_day as usize,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub outdir: Option<String>,
    pub partition_by_week: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            outdir: None,
            partition_by_week: true,
        }
    }
}

impl GeneratorConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SchedError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SchedError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OUTDIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SchedError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn offset(&self) -> Result<FixedOffset> {
        self.generator
            .utc_offset
            .parse::<FixedOffset>()
            .map_err(|e| SchedError::InvalidConfigValueError {
                field: "generator.utc_offset".to_string(),
                value: self.generator.utc_offset.clone(),
                reason: e.to_string(),
            })
    }

    pub fn outdir(&self) -> Result<&str> {
        validation::validate_required_field("output.outdir", &self.output.outdir)
            .map(|s| s.as_str())
    }

    /// Days in the configured range, both ends included.
    pub fn range_days(&self) -> usize {
        let days = (self.generator.end_date - self.generator.start_date).num_days() + 1;
        days.max(0) as usize
    }

    /// Slots a run over `sources` will emit, before partitioning.
    pub fn expected_slot_count(&self, sources: &[SourceLocation]) -> usize {
        let windows = self.slots.windows_per_day();
        sources
            .iter()
            .map(|source| match self.source.kind {
                SourceKind::Builtin => {
                    let per_window = if self.slots.booked.is_some() { 2 } else { 1 };
                    self.range_days() * windows * per_window
                }
                SourceKind::Availability => source.availability.len() * windows * 2,
            })
            .sum()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("generator.name", &self.generator.name)?;
        validation::validate_base_url("generator.base_url", &self.generator.base_url)?;
        self.offset()?;

        if self.generator.start_date > self.generator.end_date {
            return Err(SchedError::InvalidConfigValueError {
                field: "generator.end_date".to_string(),
                value: self.generator.end_date.to_string(),
                reason: format!("End date is before start date {}", self.generator.start_date),
            });
        }

        if self.source.kind == SourceKind::Availability {
            let path = validation::validate_required_field("source.path", &self.source.path)?;
            validation::validate_input_file("source.path", path, &["json"])?;
        }
        if let Some(limit) = self.source.limit {
            validation::validate_positive_number("source.limit", limit, 1)?;
        }

        validation::validate_non_empty_string("ids.schedule_prefix", &self.ids.schedule_prefix)?;

        let slots = &self.slots;
        validation::validate_range("slots.visit_minutes", slots.visit_minutes, 1, MINUTES_PER_DAY)?;
        validation::validate_range(
            "slots.open_offset_minutes",
            slots.open_offset_minutes,
            0,
            MINUTES_PER_DAY - 1,
        )?;
        match slots.granularity {
            Granularity::Coarse => {
                validation::validate_range(
                    "slots.close_offset_minutes",
                    slots.close_offset_minutes,
                    slots.open_offset_minutes + 1,
                    MINUTES_PER_DAY,
                )?;
            }
            Granularity::Fine => {
                validation::validate_positive_number(
                    "slots.slots_per_day",
                    slots.slots_per_day as usize,
                    1,
                )?;
                let day_end = slots.open_offset_minutes as u64
                    + slots.visit_minutes as u64 * slots.slots_per_day as u64;
                if day_end > MINUTES_PER_DAY as u64 {
                    return Err(SchedError::InvalidConfigValueError {
                        field: "slots.slots_per_day".to_string(),
                        value: slots.slots_per_day.to_string(),
                        reason: "Appointments run past midnight".to_string(),
                    });
                }
            }
        }
        if let Some(booked) = slots.booked {
            validation::validate_range("slots.booked", booked, 0, slots.capacity)?;
        }
        if slots.booking_link {
            validation::validate_url("slots.booking_link_base", &slots.booking_link_base)?;
        }

        if let Some(outdir) = &self.output.outdir {
            validation::validate_non_empty_string("output.outdir", outdir)?;
        }

        Ok(())
    }
}

impl Validate for GeneratorConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
