//! One-page PDF summary of a diagnosis.

use std::io::BufWriter;

use printpdf::*;
use thiserror::Error;

use crate::models::DiagnosisReport;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("PDF font error: {0}")]
    Font(String),

    #[error("PDF save error: {0}")]
    Save(String),
}

const DISCLAIMER: &str =
    "Automated screening result. It is not a medical diagnosis; consult a qualified radiologist.";

pub fn report_filename(diagnosis_id: i64) -> String {
    format!("diagnosis_{diagnosis_id}.pdf")
}

/// Renders the report as A4 PDF bytes.
pub fn generate_diagnosis_pdf(report: &DiagnosisReport) -> Result<Vec<u8>, ReportError> {
    let title = format!("Chest X-ray Diagnosis #{}", report.diagnosis_id);
    let (doc, page1, layer1) = PdfDocument::new(&title, Mm(210.0), Mm(297.0), "Layer 1");
    let layer = doc.get_page(page1).get_layer(layer1);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Font(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Font(e.to_string()))?;

    let mut y = Mm(280.0);
    layer.use_text(&title, 16.0, Mm(20.0), y, &bold);
    y -= Mm(12.0);

    layer.use_text("PATIENT", 11.0, Mm(20.0), y, &bold);
    y -= Mm(6.0);
    let age = report.patient_age.map_or_else(|| "-".to_owned(), |a| a.to_string());
    let sex = report.patient_sex.map_or("-", |s| s.label());
    for line in [
        format!("Name: {}", report.patient),
        format!("Age: {age}"),
        format!("Sex: {sex}"),
    ] {
        layer.use_text(line, 10.0, Mm(25.0), y, &font);
        y -= Mm(5.0);
    }
    y -= Mm(4.0);

    layer.use_text("IMAGE", 11.0, Mm(20.0), y, &bold);
    y -= Mm(6.0);
    for line in [
        format!("Image ID: {}", report.image_id),
        format!("View position: {}", report.view_position.label()),
        format!("Uploaded: {}", report.upload_date.format("%Y-%m-%d %H:%M UTC")),
    ] {
        layer.use_text(line, 10.0, Mm(25.0), y, &font);
        y -= Mm(5.0);
    }
    y -= Mm(4.0);

    layer.use_text("RESULT", 11.0, Mm(20.0), y, &bold);
    y -= Mm(6.0);
    layer.use_text(format!("Condition: {}", report.condition), 12.0, Mm(25.0), y, &bold);
    y -= Mm(6.0);
    for line in [
        format!("Confidence: {:.2}%", report.confidence * 100.0),
        format!("Analysed: {}", report.diagnosis_date.format("%Y-%m-%d %H:%M UTC")),
    ] {
        layer.use_text(line, 10.0, Mm(25.0), y, &font);
        y -= Mm(5.0);
    }

    y -= Mm(10.0);
    layer.use_text(DISCLAIMER, 8.0, Mm(20.0), y, &font);

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf).map_err(|e| ReportError::Save(e.to_string()))?;
    buf.into_inner().map_err(|e| ReportError::Save(e.to_string()))
}
