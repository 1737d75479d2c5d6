//! KRX market-data integration for listed ETFs.
//!
//! Every query is a form POST to a single JSON endpoint; the `bld` field selects
//! the report. Numbers come back as strings with thousands separators.

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use reqwest::header::REFERER;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::data::source::{FetchError, MarketDataSource};
use crate::domain::{FundPerformance, FundQuote, RawHolding, compact};
use crate::io::ingest::parse_number;

const BASE_URL: &str = "http://data.krx.co.kr/comm/bldAttendant/getJsonData.cmd";
const REFERER_URL: &str = "http://data.krx.co.kr/contents/MDC/MDI/mdiLoader/index.cmd";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) etfc/0.1";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// ETF listing (all issues, basic info).
const BLD_ETF_LISTING: &str = "dbms/MDC/STAT/standard/MDCSTAT04601";
/// Period price change for all ETFs.
const BLD_ETF_PRICE_CHANGE: &str = "dbms/MDC/STAT/standard/MDCSTAT04401";
/// Daily OHLCV/NAV for one ETF.
const BLD_ETF_OHLCV: &str = "dbms/MDC/STAT/standard/MDCSTAT04501";
/// Portfolio deposit file (constituents) for one ETF.
const BLD_ETF_PDF: &str = "dbms/MDC/STAT/standard/MDCSTAT05001";

pub struct KrxClient {
    client: Client,
    base_url: String,
}

impl KrxClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Build a client, honouring `KRX_BASE_URL` from the environment (`.env`).
    pub fn from_env() -> Result<Self, FetchError> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("KRX_BASE_URL").unwrap_or_else(|_| BASE_URL.to_string());
        Self::new(base_url)
    }

    fn query<T: DeserializeOwned>(
        &self,
        bld: &str,
        params: &[(&str, String)],
        what: &str,
    ) -> Result<Vec<T>, FetchError> {
        let mut form: Vec<(&str, &str)> = vec![("bld", bld), ("locale", "ko_KR")];
        form.extend(params.iter().map(|(k, v)| (*k, v.as_str())));

        debug!(bld, what, "krx query");
        let resp = self
            .client
            .post(&self.base_url)
            .header(REFERER, REFERER_URL)
            .form(&form)
            .send()?;

        if !resp.status().is_success() {
            return Err(FetchError::Status {
                status: resp.status().as_u16(),
                what: what.to_string(),
            });
        }

        let body: KrxResponse<T> = resp
            .json()
            .map_err(|e| FetchError::Parse(format!("Failed to decode {what}: {e}")))?;
        Ok(body.output)
    }
}

impl MarketDataSource for KrxClient {
    fn fund_universe(&self, date: NaiveDate, lookback_days: u32) -> Result<Vec<FundPerformance>, FetchError> {
        let trd_dd = compact(date);
        let listing: Vec<ListingRow> = self.query(
            BLD_ETF_LISTING,
            &[("share", "1".to_string()), ("trdDd", trd_dd.clone())],
            "etf listing",
        )?;
        if listing.is_empty() {
            return Err(FetchError::no_data("etf listing", date));
        }

        let start = lookback_start(date, lookback_days)?;
        let changes: Vec<PriceChangeRow> = self.query(
            BLD_ETF_PRICE_CHANGE,
            &[
                ("strtDd", compact(start)),
                ("endDd", trd_dd),
                ("share", "1".to_string()),
                ("money", "1".to_string()),
            ],
            "etf price change",
        )?;
        if changes.is_empty() {
            return Err(FetchError::no_data("etf price change", date));
        }

        Ok(join_universe(listing, changes))
    }

    fn fund_quote(&self, fund: &FundPerformance, date: NaiveDate) -> Result<FundQuote, FetchError> {
        let day = compact(date);
        let rows: Vec<OhlcvRow> = self.query(
            BLD_ETF_OHLCV,
            &[("isuCd", fund.isin.clone()), ("strtDd", day.clone()), ("endDd", day)],
            "etf ohlcv",
        )?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::no_data(format!("quote {}", fund.ticker), date))?;
        row.into_quote()
            .ok_or_else(|| FetchError::Parse(format!("Unparseable quote for {}", fund.ticker)))
    }

    fn fund_holdings(&self, fund: &FundPerformance, date: NaiveDate) -> Result<Vec<RawHolding>, FetchError> {
        let rows: Vec<PdfRow> = self.query(
            BLD_ETF_PDF,
            &[("isuCd", fund.isin.clone()), ("trdDd", compact(date))],
            "etf portfolio deposit file",
        )?;
        if rows.is_empty() {
            return Err(FetchError::no_data(format!("holdings {}", fund.ticker), date));
        }
        Ok(rows.into_iter().map(PdfRow::into_raw).collect())
    }
}

#[derive(Debug, Deserialize)]
struct KrxResponse<T> {
    #[serde(alias = "OutBlock_1", alias = "block1")]
    output: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct ListingRow {
    isu_cd: String,
    isu_srt_cd: String,
    isu_abbrv: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct PriceChangeRow {
    isu_srt_cd: String,
    #[serde(default)]
    fluc_rt: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct OhlcvRow {
    #[serde(default)]
    tdd_opnprc: String,
    #[serde(default)]
    tdd_clsprc: String,
    #[serde(default)]
    lst_nav: String,
    #[serde(default)]
    acc_trdvol: String,
    #[serde(default)]
    acc_trdval: String,
}

impl OhlcvRow {
    fn into_quote(self) -> Option<FundQuote> {
        let close = parse_number(&self.tdd_clsprc)?;
        Some(FundQuote {
            open: parse_number(&self.tdd_opnprc).unwrap_or(0.0),
            close,
            nav: parse_number(&self.lst_nav),
            volume: parse_number(&self.acc_trdvol).unwrap_or(0.0),
            trading_value: parse_number(&self.acc_trdval).unwrap_or(0.0),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct PdfRow {
    #[serde(default)]
    compst_isu_cd: String,
    #[serde(default)]
    compst_isu_nm: String,
    #[serde(default)]
    compst_rto: String,
    #[serde(default)]
    valu_amt: String,
}

impl PdfRow {
    fn into_raw(self) -> RawHolding {
        RawHolding {
            security_id: self.compst_isu_cd,
            security_name: self.compst_isu_nm,
            weight: non_empty(self.compst_rto),
            value_amount: non_empty(self.valu_amt),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == "-" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Attach trailing returns to listed funds; funds without a parseable return are dropped.
fn join_universe(listing: Vec<ListingRow>, changes: Vec<PriceChangeRow>) -> Vec<FundPerformance> {
    let returns: HashMap<String, f64> = changes
        .into_iter()
        .filter_map(|row| parse_number(&row.fluc_rt).map(|r| (row.isu_srt_cd, r)))
        .collect();

    listing
        .into_iter()
        .filter_map(|row| {
            let Some(&trailing_return) = returns.get(&row.isu_srt_cd) else {
                debug!(ticker = %row.isu_srt_cd, "no trailing return, skipping");
                return None;
            };
            Some(FundPerformance {
                ticker: row.isu_srt_cd,
                isin: row.isu_cd,
                name: row.isu_abbrv,
                trailing_return,
            })
        })
        .collect()
}

/// First day of the trailing-return window ending at `date`.
fn lookback_start(date: NaiveDate, lookback_days: u32) -> Result<NaiveDate, FetchError> {
    date.checked_sub_signed(chrono::Duration::days(i64::from(lookback_days)))
        .ok_or_else(|| FetchError::Parse(format!("Lookback of {lookback_days} days from {date} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookback_start_rejects_out_of_range_windows() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert_eq!(lookback_start(date, 90).unwrap(), NaiveDate::from_ymd_opt(2024, 10, 8).unwrap());
        assert!(matches!(lookback_start(date, u32::MAX), Err(FetchError::Parse(_))));
    }

    #[test]
    fn decodes_output_block_and_joins_returns() {
        let listing_json = r#"{"output":[
            {"ISU_CD":"KR7441800009","ISU_SRT_CD":"441800","ISU_ABBRV":"TIMEFOLIO Korea플러스배당액티브"},
            {"ISU_CD":"KR7385720008","ISU_SRT_CD":"385720","ISU_ABBRV":"TIMEFOLIO 코스피액티브"},
            {"ISU_CD":"KR7069500007","ISU_SRT_CD":"069500","ISU_ABBRV":"KODEX 200"}
        ],"CURRENT_DATETIME":"2025.01.03 PM 04:00:00"}"#;
        let changes_json = r#"{"OutBlock_1":[
            {"ISU_SRT_CD":"441800","FLUC_RT":"12.34"},
            {"ISU_SRT_CD":"385720","FLUC_RT":"-"},
            {"ISU_SRT_CD":"069500","FLUC_RT":"1,012.50"}
        ]}"#;

        let listing: KrxResponse<ListingRow> = serde_json::from_str(listing_json).unwrap();
        let changes: KrxResponse<PriceChangeRow> = serde_json::from_str(changes_json).unwrap();
        let universe = join_universe(listing.output, changes.output);

        // "-" means missing; thousands separators are accepted.
        assert_eq!(universe.len(), 2);
        assert_eq!(universe[0].ticker, "441800");
        assert_eq!(universe[0].isin, "KR7441800009");
        assert!((universe[0].trailing_return - 12.34).abs() < 1e-12);
        assert_eq!(universe[1].ticker, "069500");
        assert!((universe[1].trailing_return - 1012.5).abs() < 1e-12);
    }

    #[test]
    fn pdf_rows_keep_strings_and_drop_placeholders() {
        let json = r#"{"output":[
            {"COMPST_ISU_CD":"005930","COMPST_ISU_NM":"삼성전자","COMPST_RTO":"9.87","VALU_AMT":"1,234,000"},
            {"COMPST_ISU_CD":"KRD010010001","COMPST_ISU_NM":"원화예금","COMPST_RTO":"-","VALU_AMT":""}
        ]}"#;
        let body: KrxResponse<PdfRow> = serde_json::from_str(json).unwrap();
        let raw: Vec<RawHolding> = body.output.into_iter().map(PdfRow::into_raw).collect();

        assert_eq!(raw[0].security_id, "005930");
        assert_eq!(raw[0].weight.as_deref(), Some("9.87"));
        assert_eq!(raw[0].value_amount.as_deref(), Some("1,234,000"));
        assert_eq!(raw[1].weight, None);
        assert_eq!(raw[1].value_amount, None);
    }

    #[test]
    fn ohlcv_row_requires_close() {
        let row = OhlcvRow {
            tdd_opnprc: "10,000".to_string(),
            tdd_clsprc: "10,250".to_string(),
            lst_nav: "10,240.55".to_string(),
            acc_trdvol: "1,000".to_string(),
            acc_trdval: "10,250,000".to_string(),
        };
        let quote = row.into_quote().unwrap();
        assert_eq!(quote.open, 10_000.0);
        assert_eq!(quote.close, 10_250.0);
        assert_eq!(quote.nav, Some(10_240.55));

        let missing = OhlcvRow {
            tdd_opnprc: String::new(),
            tdd_clsprc: "-".to_string(),
            lst_nav: String::new(),
            acc_trdvol: String::new(),
            acc_trdval: String::new(),
        };
        assert!(missing.into_quote().is_none());
    }
}
