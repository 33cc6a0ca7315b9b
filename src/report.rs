// PDF export: title, KPI summary and the six chart images.
use crate::chart::{chart_specs, rasterize, ChartSpec, RgbImage};
use crate::error::{DashboardError, Result};
use crate::types::{Dashboard, Kpis};
use crate::util::format_opt;
use log::{debug, info};
use printpdf::{
    BuiltinFont, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, IndirectFontRef, Mm,
    PdfDocument, PdfDocumentReference, PdfLayerReference, Px,
};
use std::path::Path;

pub const REPORT_FILE_NAME: &str = "Intelligent_Manufacturing_Report.pdf";
pub const REPORT_MIME: &str = "application/pdf";
pub const REPORT_TITLE: &str = "Intelligent Manufacturing Dataset - Analysis Report";

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 20.0;
const PT_TO_MM: f32 = 25.4 / 72.0;

// Charts are placed at 400x250 pt, rendered at twice that resolution.
const CHART_PT: (f32, f32) = (400.0, 250.0);
const CHART_PX: (u32, u32) = (800, 500);

fn pdf_err<E: std::fmt::Display>(e: E) -> DashboardError {
    DashboardError::Pdf(e.to_string())
}

/// KPI lines as they appear in the report, `label: value`.
pub fn kpi_lines(k: &Kpis) -> Vec<String> {
    vec![
        format!("Total Machines: {}", k.total_machines),
        format!("Avg Production Speed: {}", format_opt(k.avg_production, 2)),
        format!("Avg Error Rate (%): {}", format_opt(k.avg_error, 2)),
        format!("Avg Temperature (C): {}", format_opt(k.avg_temp, 2)),
        format!("Avg QC Defect Rate (%): {}", format_opt(k.avg_qc_defect, 2)),
        format!("Avg Power Consumption (kW): {}", format_opt(k.avg_consumption, 2)),
        format!("Avg Vibration (Hz): {}", format_opt(k.avg_vibration, 2)),
        format!("High Risk Machines: {}", k.high_risk_machines),
        format!("Efficiency (%): {}", format_opt(k.efficiency.map(|e| e * 100.0), 2)),
    ]
}

/// Top-down flow layout over A4 pages.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    pages: usize,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?;
        Ok(PageWriter {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_H - MARGIN,
            pages: 1,
        })
    }

    /// Start a new page unless `height` mm still fit on this one.
    fn ensure(&mut self, height: f32) {
        if self.y - height >= MARGIN {
            return;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_H - MARGIN;
        self.pages += 1;
    }

    fn text(&mut self, line: &str, size: f32, bold: bool) {
        let height = size * PT_TO_MM * 1.4;
        self.ensure(height);
        self.y -= height;
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(line, size, Mm(MARGIN), Mm(self.y), font);
    }

    fn space(&mut self, pt: f32) {
        self.y -= pt * PT_TO_MM;
    }

    fn chart(&mut self, spec: &ChartSpec, img: RgbImage) {
        let (w_pt, h_pt) = CHART_PT;
        let img_h = h_pt * PT_TO_MM;
        // caption + image + label line must stay together
        self.ensure(img_h + 16.0);
        self.text(spec.title, 11.0, true);
        self.y -= img_h + 1.0;
        let dpi = img.width as f32 * 72.0 / w_pt;
        let image = Image::from(ImageXObject {
            width: Px(img.width as usize),
            height: Px(img.height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: img.pixels,
            image_filter: None,
            smask: None,
            clipping_bbox: None,
        });
        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN)),
                translate_y: Some(Mm(self.y)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        self.text(&bar_legend(spec), 8.0, false);
    }

    fn finish(self) -> Result<Vec<u8>> {
        debug!("pdf layout finished on {} page(s)", self.pages);
        self.doc.save_to_bytes().map_err(pdf_err)
    }
}

fn bar_legend(spec: &ChartSpec) -> String {
    if spec.bars.is_empty() {
        return format!("{}: no data", spec.y_label);
    }
    let mut s = format!("{}: ", spec.y_label);
    let items: Vec<String> = spec
        .bars
        .iter()
        .map(|b| format!("{} = {}", b.label, format_opt(b.value, 2)))
        .collect();
    s.push_str(&items.join("; "));
    if s.chars().count() > 120 {
        s = s.chars().take(117).collect::<String>() + "...";
    }
    s
}

/// Build the whole report in memory.
pub fn render_pdf(dash: &Dashboard) -> Result<Vec<u8>> {
    let mut w = PageWriter::new(REPORT_TITLE)?;
    w.text(REPORT_TITLE, 18.0, true);
    w.space(12.0);

    w.text("KPI Summary", 14.0, true);
    for line in kpi_lines(&dash.kpis) {
        w.text(&line, 11.0, false);
    }
    w.space(20.0);

    w.text("Analysis Charts", 14.0, true);
    w.space(12.0);
    for spec in chart_specs(&dash.charts) {
        let img = rasterize(&spec, CHART_PX.0, CHART_PX.1)?;
        w.chart(&spec, img);
        w.space(16.0);
    }
    w.finish()
}

/// Render and write the report; returns the number of bytes written.
pub fn export_pdf<P: AsRef<Path>>(dash: &Dashboard, path: P) -> Result<usize> {
    let bytes = render_pdf(dash)?;
    crate::output::write_bytes(path.as_ref(), &bytes)?;
    info!(
        "wrote {} ({} bytes, {})",
        path.as_ref().display(),
        bytes.len(),
        REPORT_MIME
    );
    Ok(bytes.len())
}
