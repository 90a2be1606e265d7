use std::path::Path;
use csv::Writer;
use crate::library::import::ImportOutcome;
use crate::{Result, Sample};

pub struct Reporter;

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    pub fn new() -> Self {
        Self
    }

    /// One row per import outcome.
    pub fn generate_import_report(&self, outcomes: &[ImportOutcome], output_path: impl AsRef<Path>) -> Result<()> {
        let output_path_ref = output_path.as_ref();
        let mut writer = Writer::from_path(output_path_ref)?;

        writer.write_record(["Name", "Folder", "Status", "Detail"])?;

        for outcome in outcomes {
            match outcome {
                Ok(sample) => writer.write_record([
                    sample.original_name.as_str(),
                    sample.folder.to_string().as_str(),
                    "imported",
                    sample.id.to_string().as_str(),
                ])?,
                Err(e) => writer.write_record([e.name(), "", e.kind(), e.to_string().as_str()])?,
            }
        }

        let imported = outcomes.iter().filter(|o| o.is_ok()).count();
        writer.write_record(["", "", "", ""])?;
        writer.write_record(["Summary", "", "", ""])?;
        writer.write_record(["Imported", imported.to_string().as_str(), "", ""])?;
        writer.write_record(["Rejected", (outcomes.len() - imported).to_string().as_str(), "", ""])?;

        writer.flush()?;
        log::info!("Import report generated: {}", output_path_ref.display());
        Ok(())
    }

    /// One row per sample, tags joined with `;`.
    pub fn generate_catalog(&self, samples: &[Sample], output_path: impl AsRef<Path>) -> Result<()> {
        let output_path_ref = output_path.as_ref();
        let mut writer = Writer::from_path(output_path_ref)?;

        writer.write_record([
            "Id",
            "Title",
            "Original Name",
            "Path",
            "Tags",
            "Duration (s)",
            "Sample Rate (Hz)",
            "Bitrate (kbps)",
            "Content Hash",
            "Created",
            "Updated",
        ])?;

        for sample in samples {
            writer.write_record([
                sample.id.to_string(),
                sample.title.clone(),
                sample.original_name.clone(),
                sample.relative_path.to_string(),
                sample.tags.join(";"),
                format!("{:.3}", sample.media.duration),
                sample.media.sample_rate.to_string(),
                format!("{:.1}", sample.media.bit_rate),
                sample.content_hash.clone().unwrap_or_default(),
                sample.created_at.to_rfc3339(),
                sample.updated_at.to_rfc3339(),
            ])?;
        }

        writer.flush()?;
        log::info!("Catalog generated: {}", output_path_ref.display());
        Ok(())
    }
}
