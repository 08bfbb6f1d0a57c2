use anyhow::Context;
use chrono::Utc;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
pub const BULK_PROFILE_FORMAT_V1: &str = "rollbook-profiles-v1";

#[derive(Debug, Clone)]
pub struct ProfileDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ProfileSummary {
    pub byte_count: usize,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct BulkSummary {
    pub format: String,
    pub profile_count: usize,
}

fn field<'a>(record: &'a serde_json::Value, name: &str) -> &'a str {
    record.get(name).and_then(|v| v.as_str()).unwrap_or("")
}

fn push_line(out: &mut String, label: &str, value: &str) {
    // 16-column label gutter keeps the card readable in any monospace viewer.
    out.push_str(&format!("{:<16}{}\n", label, value));
}

// Printable profile card: roster fields plus the household income record when
// one exists. Plain UTF-8 text; the rendering side of the document pipeline
// lives with the caller, not here.
pub fn render_profile(
    student: &serde_json::Value,
    income: Option<&serde_json::Value>,
) -> ProfileDocument {
    let mykid = field(student, "mykid");

    let mut text = String::new();
    text.push_str("STUDENT PROFILE\n");
    text.push_str("===============\n\n");
    push_line(&mut text, "Name", field(student, "name"));
    push_line(&mut text, "Class", field(student, "class"));
    push_line(&mut text, "MyKid No.", mykid);
    push_line(&mut text, "Gender", field(student, "gender"));
    push_line(&mut text, "Guardian Phone", field(student, "guardian_phone"));

    match income {
        Some(rec) => {
            text.push_str("\nHOUSEHOLD INCOME\n");
            push_line(&mut text, "Guardian", field(rec, "guardian_name"));
            push_line(&mut text, "Occupation", field(rec, "occupation"));
            push_line(&mut text, "Monthly (RM)", field(rec, "monthly_income_rm"));
            push_line(&mut text, "Household Size", field(rec, "household_size"));
        }
        None => {
            text.push_str("\nHOUSEHOLD INCOME\n");
            text.push_str("No income record on file.\n");
        }
    }

    text.push_str(&format!(
        "\nIssued by rollbookd {} at {}\n",
        env!("CARGO_PKG_VERSION"),
        Utc::now().to_rfc3339()
    ));

    ProfileDocument {
        file_name: format!("profile-{}.txt", safe_file_stem(mykid)),
        bytes: text.into_bytes(),
    }
}

// MyKid numbers carry dashes; anything else unusual is flattened so the file
// name stays portable.
fn safe_file_stem(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn write_profile(doc: &ProfileDocument, out_path: &Path) -> anyhow::Result<ProfileSummary> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let mut file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    file.write_all(&doc.bytes)
        .with_context(|| format!("failed to write {}", out_path.to_string_lossy()))?;
    Ok(ProfileSummary {
        byte_count: doc.bytes.len(),
        sha256: sha256_hex(&doc.bytes),
    })
}

pub fn write_bulk_profiles(
    docs: &[ProfileDocument],
    out_path: &Path,
) -> anyhow::Result<BulkSummary> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let entries: Vec<serde_json::Value> = docs
        .iter()
        .map(|d| {
            json!({
                "name": format!("profiles/{}", d.file_name),
                "sha256": sha256_hex(&d.bytes),
            })
        })
        .collect();
    let manifest = json!({
        "format": BULK_PROFILE_FORMAT_V1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "profileCount": docs.len(),
        "entries": entries,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    for doc in docs {
        zip.start_file(format!("profiles/{}", doc.file_name), opts)
            .with_context(|| format!("failed to start entry {}", doc.file_name))?;
        zip.write_all(&doc.bytes)
            .with_context(|| format!("failed to write entry {}", doc.file_name))?;
    }

    zip.finish().context("failed to finalize profile archive")?;
    Ok(BulkSummary {
        format: BULK_PROFILE_FORMAT_V1.to_string(),
        profile_count: docs.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_keeps_key_text_verbatim() {
        let student = json!({
            "name": "Wei Ming",
            "class": "1A",
            "mykid": "090402-10-1234",
            "gender": "M",
            "guardian_phone": "012-3456789",
        });
        let doc = render_profile(&student, None);
        let text = String::from_utf8(doc.bytes).expect("utf8");
        assert!(text.contains("090402-10-1234"));
        assert!(text.contains("No income record on file."));
        assert_eq!(doc.file_name, "profile-090402-10-1234.txt");
    }

    #[test]
    fn income_section_uses_submitted_income_text() {
        let student = json!({ "name": "Aisyah", "mykid": "110203" });
        let income = json!({
            "guardian_name": "Siti",
            "occupation": "Trader",
            "monthly_income_rm": "0950.00",
            "household_size": "6",
        });
        let doc = render_profile(&student, Some(&income));
        let text = String::from_utf8(doc.bytes).expect("utf8");
        assert!(text.contains("0950.00"));
    }

    #[test]
    fn odd_key_characters_are_flattened_in_file_names() {
        let student = json!({ "name": "X", "mykid": "a/b c" });
        let doc = render_profile(&student, None);
        assert_eq!(doc.file_name, "profile-a_b_c.txt");
    }
}
