// Data source
pub const ECB_BASE_URL: &str = "https://data-api.ecb.europa.eu/service/data/EXR/";

// Series key dimensions (FREQ.CURRENCY.CURRENCY_DENOM.EXR_TYPE.EXR_SUFFIX)
pub const DAILY_FREQUENCY: &str = "D";
pub const REFERENCE_RATE_TYPE: &str = "SP00";
pub const AVERAGE_VARIATION: &str = "A";

// ECB reference rates are all quoted against the euro
pub const BASE_CURRENCY: &str = "EUR";

// Tap metadata
pub const TAP_NAME: &str = "tap-ecbexchangerates";
pub const STREAM_NAME: &str = "exchange_rates";
pub const PRIMARY_KEYS: &[&str] = &["date", "base_currency", "target_currency"];
pub const CAPABILITIES: &[&str] = &["catalog", "discover", "state", "about"];

// Dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_START_DATE: &str = "2000-01-01";
pub const RESUME_LOOKBACK_DAYS: u32 = 7;

// Currency validation
pub const CURRENCY_CODE_PATTERN: &str = r"^[A-Z]{3}$";
