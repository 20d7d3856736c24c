//! Member CSV import/export
//!
//! Column set (header row required, any order):
//! `first_name,last_name,national_id,birth_date,phone,email,address,bank_name,account_number`
//!
//! Export quotes every field. Import is permissive: each data row is parsed
//! and validated on its own, bad rows are collected into the report and the
//! remaining rows are still imported.

use std::collections::HashSet;

use csv::{QuoteStyle, ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use shared::ErrorCode;
use shared::models::MemberCreate;
use sqlx::SqlitePool;

use crate::auth::CurrentUser;
use crate::db::repository::{RepoError, bank, member};
use crate::services::ensure_admin;
use crate::services::members::{normalize_create, validate_create};
use crate::utils::AppError;

/// Export/import column order
pub const CSV_COLUMNS: [&str; 9] = [
    "first_name",
    "last_name",
    "national_id",
    "birth_date",
    "phone",
    "email",
    "address",
    "bank_name",
    "account_number",
];

/// Columns that must be present in an import header
const REQUIRED_COLUMNS: [&str; 3] = ["first_name", "last_name", "national_id"];

/// One rejected import row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRowError {
    /// 1-based data row number (header excluded)
    pub row: usize,
    pub message: String,
}

/// Import outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Rows inserted
    pub success: usize,
    pub errors: Vec<ImportRowError>,
}

/// One CSV data row; missing optional columns deserialize as `None`
#[derive(Debug, Deserialize)]
struct CsvMemberRow {
    first_name: String,
    last_name: String,
    national_id: String,
    #[serde(default)]
    birth_date: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    bank_name: Option<String>,
    #[serde(default)]
    account_number: Option<String>,
}

/// Export all active members as CSV text
pub async fn export_members(pool: &SqlitePool, ctx: &CurrentUser) -> Result<String, AppError> {
    ensure_admin(ctx, "export members")?;
    let members = member::find_all(pool).await?;

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());
    writer.write_record(CSV_COLUMNS).map_err(csv_write_error)?;

    for m in &members {
        writer
            .write_record([
                m.first_name.as_str(),
                m.last_name.as_str(),
                m.national_id.as_str(),
                m.birth_date.as_deref().unwrap_or(""),
                m.phone.as_deref().unwrap_or(""),
                m.email.as_deref().unwrap_or(""),
                m.address.as_deref().unwrap_or(""),
                m.bank_name.as_deref().unwrap_or(""),
                m.account_number.as_deref().unwrap_or(""),
            ])
            .map_err(csv_write_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::internal(format!("Failed to finish CSV export: {e}")))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| AppError::internal(format!("CSV export is not UTF-8: {e}")))?;

    tracing::info!(rows = members.len(), actor = ctx.id, "Members exported");
    Ok(text)
}

/// Import members from CSV bytes
///
/// A missing or unusable header fails the whole file with
/// `ImportHeaderInvalid`. A database failure aborts the import; rows written
/// before it stay written.
pub async fn import_members(
    pool: &SqlitePool,
    ctx: &CurrentUser,
    data: &[u8],
) -> Result<ImportReport, AppError> {
    ensure_admin(ctx, "import members")?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| header_error(format!("Unreadable header row: {e}")))?
        .clone();
    let headers = normalize_headers(&headers);
    validate_headers(&headers)?;

    let mut report = ImportReport::default();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for (index, result) in reader.records().enumerate() {
        let row = index + 1;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                report.errors.push(row_error(row, format!("Malformed row: {e}")));
                continue;
            }
        };

        match import_row(pool, &headers, &record, &mut seen_ids).await {
            Ok(()) => report.success += 1,
            Err(RowFailure::Rejected(message)) => report.errors.push(row_error(row, message)),
            Err(RowFailure::Fatal(err)) => return Err(err),
        }
    }

    tracing::info!(
        imported = report.success,
        rejected = report.errors.len(),
        actor = ctx.id,
        "Member CSV import finished"
    );
    Ok(report)
}

enum RowFailure {
    /// Row-level problem, recorded in the report
    Rejected(String),
    /// Backend failure, aborts the import
    Fatal(AppError),
}

impl From<RepoError> for RowFailure {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate(_) => RowFailure::Rejected("national_id already exists".into()),
            RepoError::Validation(msg) => RowFailure::Rejected(msg),
            other => RowFailure::Fatal(other.into()),
        }
    }
}

async fn import_row(
    pool: &SqlitePool,
    headers: &StringRecord,
    record: &StringRecord,
    seen_ids: &mut HashSet<String>,
) -> Result<(), RowFailure> {
    if record.len() != headers.len() {
        return Err(RowFailure::Rejected(format!(
            "Expected {} fields, found {}",
            headers.len(),
            record.len()
        )));
    }

    let parsed: CsvMemberRow = record
        .deserialize(Some(headers))
        .map_err(|e| RowFailure::Rejected(format!("Invalid row: {e}")))?;

    let bank_id = match parsed.bank_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => match bank::find_by_name(pool, name).await? {
            Some(b) => Some(b.id),
            None => return Err(RowFailure::Rejected(format!("Unknown bank '{name}'"))),
        },
        _ => None,
    };

    let form = normalize_create(MemberCreate {
        first_name: parsed.first_name,
        last_name: parsed.last_name,
        national_id: parsed.national_id,
        birth_date: parsed.birth_date,
        phone: parsed.phone,
        email: parsed.email,
        address: parsed.address,
        bank_id,
        account_number: parsed.account_number,
    });
    validate_create(&form).map_err(|e| RowFailure::Rejected(e.message))?;

    if !seen_ids.insert(form.national_id.clone()) {
        return Err(RowFailure::Rejected(format!(
            "national_id '{}' appears more than once in the file",
            form.national_id
        )));
    }
    if member::find_by_national_id(pool, &form.national_id).await?.is_some() {
        return Err(RowFailure::Rejected(format!(
            "national_id '{}' already exists",
            form.national_id
        )));
    }

    member::create(pool, form).await?;
    Ok(())
}

/// Lowercase, trim, and strip a UTF-8 BOM from header names
fn normalize_headers(headers: &StringRecord) -> StringRecord {
    headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_ascii_lowercase())
        .collect()
}

fn validate_headers(headers: &StringRecord) -> Result<(), AppError> {
    let present: HashSet<&str> = headers.iter().collect();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !present.contains(c))
        .collect();
    if !missing.is_empty() {
        return Err(header_error(format!(
            "Missing required column(s): {}",
            missing.join(", ")
        )));
    }

    if let Some(unknown) = headers.iter().find(|h| !CSV_COLUMNS.contains(h)) {
        return Err(header_error(format!("Unknown column '{unknown}'")));
    }
    if present.len() != headers.len() {
        return Err(header_error("Duplicate column in header"));
    }
    Ok(())
}

fn header_error(message: impl Into<String>) -> AppError {
    AppError::with_message(ErrorCode::ImportHeaderInvalid, message)
        .with_detail("expected", CSV_COLUMNS.join(","))
}

fn row_error(row: usize, message: String) -> ImportRowError {
    ImportRowError { row, message }
}

fn csv_write_error(e: csv::Error) -> AppError {
    AppError::internal(format!("Failed to write CSV: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::*;
    use shared::models::BankCreate;

    const HEADER: &str = "first_name,last_name,national_id,birth_date,phone,email,address,bank_name,account_number\n";

    fn good_row(i: usize) -> String {
        format!("Name{i},Family{i},NID-{i},1990-01-0{},+597 {i},m{i}@mail.sr,Street {i},,\n", i % 9 + 1)
    }

    #[tokio::test]
    async fn test_import_all_good_rows() {
        let pool = pool().await;
        let mut csv = HEADER.to_string();
        for i in 0..5 {
            csv.push_str(&good_row(i));
        }

        let report = import_members(&pool, &admin(), csv.as_bytes()).await.unwrap();
        assert_eq!(report.success, 5);
        assert!(report.errors.is_empty());
        assert_eq!(member::count(&pool).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_import_one_bad_row() {
        let pool = pool().await;
        let mut csv = HEADER.to_string();
        csv.push_str(&good_row(0));
        csv.push_str(&good_row(1));
        // Missing last_name and national_id, wrong arity
        csv.push_str("Broken\n");
        csv.push_str(&good_row(3));

        let report = import_members(&pool, &admin(), csv.as_bytes()).await.unwrap();
        assert_eq!(report.success, 3);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].row, 3);
    }

    #[tokio::test]
    async fn test_import_row_rules() {
        let pool = pool().await;
        bank::create(
            &pool,
            BankCreate {
                name: "Hakrinbank".into(),
                short_name: Some("HKB".into()),
            },
        )
        .await
        .unwrap();
        add_member(&pool, "Existing", "DUP-DB").await;

        let csv = format!(
            "{HEADER}\
             Ann,Lie,A-1,1990-02-30,,,,,\n\
             Ben,Lie,A-2,,,,,NoSuchBank,\n\
             Cas,Lie,DUP-DB,,,,,,\n\
             Dee,Lie,A-4,,,,,hkb,123\n\
             Eli,Lie,A-4,,,,,,\n\
             ,Lie,A-6,,,,,,\n"
        );
        let report = import_members(&pool, &admin(), csv.as_bytes()).await.unwrap();
        assert_eq!(report.success, 1);
        let rows: Vec<usize> = report.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![1, 2, 3, 5, 6]);
        assert!(report.errors[1].message.contains("NoSuchBank"));

        let dee = member::find_by_national_id(&pool, "A-4").await.unwrap().unwrap();
        assert!(dee.bank_id.is_some());
        assert_eq!(dee.account_number.as_deref(), Some("123"));
    }

    #[tokio::test]
    async fn test_import_header_order_and_errors() {
        let pool = pool().await;
        let csv = "national_id,last_name,first_name\nX-1,Doe,Jan\n";
        let report = import_members(&pool, &admin(), csv.as_bytes()).await.unwrap();
        assert_eq!(report.success, 1);

        let err = import_members(&pool, &admin(), b"first_name,last_name\nA,B\n")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ImportHeaderInvalid);

        let err = import_members(&pool, &admin(), b"").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ImportHeaderInvalid);

        let err = import_members(
            &pool,
            &admin(),
            b"first_name,last_name,national_id,favourite_color\nA,B,C,D\n",
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ImportHeaderInvalid);
    }

    #[tokio::test]
    async fn test_import_requires_admin() {
        let pool = pool().await;
        let csv = format!("{HEADER}{}", good_row(1));
        let err = import_members(&pool, &member_user(None), csv.as_bytes())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AdminRequired);
        assert_eq!(member::count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_export_quotes_every_field() {
        let pool = pool().await;
        let mut form = member_form("Jo, \"JJ\"", "E-1");
        form.phone = Some("123".into());
        member::create(&pool, form).await.unwrap();

        let text = export_members(&pool, &admin()).await.unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "\"first_name\",\"last_name\",\"national_id\",\"birth_date\",\"phone\",\"email\",\"address\",\"bank_name\",\"account_number\""
        );
        assert_eq!(
            lines.next().unwrap(),
            "\"Jo, \"\"JJ\"\"\",\"Test\",\"E-1\",\"\",\"123\",\"\",\"\",\"\",\"\""
        );
        assert!(lines.next().is_none());

        // Exported text imports back cleanly into an empty database
        let other = crate::services::test_support::pool().await;
        let report = import_members(&other, &admin(), text.as_bytes()).await.unwrap();
        assert_eq!(report.success, 1);
    }
}
