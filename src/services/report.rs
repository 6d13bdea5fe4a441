//! PDF-rapporter: enskilda kvitton och historiker
//!
//! Koordinater anges i mm från sidans överkant, som i pappersförlagan, och
//! räknas om till PDF:ens nedre origo vid utskrift.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rect, Rgb,
};

use crate::models::{format_amount, Collection, DisplayCurrency, Record};
use crate::store::RecordStore;
use crate::utils::date::{format_optional_fr, sort_key, today_fr};
use crate::utils::file_ops::write_file;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
/// Ny sida när raden passerar denna höjd
const PAGE_BREAK_Y: f32 = 270.0;
const CONTINUATION_Y: f32 = 20.0;
const ROW_HEIGHT: f32 = 8.0;

/// Typ av rapport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Receipt,
    Revision,
    Payment,
    Expense,
    PaymentHistory,
    ExpenseHistory,
    ReceiptHistory,
    RevisionHistory,
}

impl ReportKind {
    pub fn all() -> &'static [ReportKind] {
        &[
            Self::Receipt,
            Self::Revision,
            Self::Payment,
            Self::Expense,
            Self::PaymentHistory,
            Self::ExpenseHistory,
            Self::ReceiptHistory,
            Self::RevisionHistory,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Receipt => "Quittance",
            Self::Revision => "Révision de loyer",
            Self::Payment => "Encaissement",
            Self::Expense => "Dépense",
            Self::PaymentHistory => "Historique des Encaissements",
            Self::ExpenseHistory => "Historique des Dépenses",
            Self::ReceiptHistory => "Historique des Quittances",
            Self::RevisionHistory => "Historique des Révisions de Loyers",
        }
    }

    /// Namn på kommandoraden och i filnamn
    pub fn key(&self) -> &'static str {
        match self {
            Self::Receipt => "receipt",
            Self::Revision => "revision",
            Self::Payment => "payment",
            Self::Expense => "expense",
            Self::PaymentHistory => "payments",
            Self::ExpenseHistory => "expenses",
            Self::ReceiptHistory => "receipts",
            Self::RevisionHistory => "revisions",
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            Self::Receipt | Self::ReceiptHistory => Collection::Receipts,
            Self::Revision | Self::RevisionHistory => Collection::Revisions,
            Self::Payment | Self::PaymentHistory => Collection::Payments,
            Self::Expense | Self::ExpenseHistory => Collection::Expenses,
        }
    }

    /// Enskild post (kräver position) eller hela samlingen
    pub fn is_single(&self) -> bool {
        matches!(
            self,
            Self::Receipt | Self::Revision | Self::Payment | Self::Expense
        )
    }

    fn empty_message(&self) -> &'static str {
        match self.collection() {
            Collection::Payments => "Aucun encaissement à imprimer.",
            Collection::Expenses => "Aucune dépense à imprimer.",
            Collection::Receipts => "Aucune quittance à imprimer.",
            _ => "Aucune révision à imprimer.",
        }
    }

    /// Färg på rubrikbandet
    fn band_color(&self) -> (u8, u8, u8) {
        match self {
            Self::Receipt | Self::ReceiptHistory => (102, 51, 153),
            Self::Expense | Self::ExpenseHistory => (204, 0, 0),
            Self::RevisionHistory => (0, 102, 0),
            Self::Revision | Self::Payment | Self::PaymentHistory => (0, 102, 204),
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|k| k.key() == s)
            .ok_or_else(|| {
                let keys: Vec<&str> = Self::all().iter().map(|k| k.key()).collect();
                format!("rapport inconnu {:?}, choisir parmi : {}", s, keys.join(", "))
            })
    }
}

/// Resultat av export
#[derive(Debug)]
pub struct ReportResult {
    pub kind: ReportKind,
    pub row_count: usize,
    pub file_size: usize,
}

impl ReportResult {
    pub fn summary(&self) -> String {
        format!(
            "{} exporté : {} lignes, {} octets",
            self.kind.display_name(),
            self.row_count,
            self.file_size
        )
    }
}

/// Rapport-tjänst
pub struct ReportService<'a> {
    store: &'a RecordStore,
    currency: DisplayCurrency,
}

impl<'a> ReportService<'a> {
    pub fn new(store: &'a RecordStore, currency: DisplayCurrency) -> Self {
        Self { store, currency }
    }

    /// Generera filnamn för rapport
    pub fn generate_filename(kind: ReportKind) -> String {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        format!("locadan_{}_{}.pdf", kind.key(), timestamp)
    }

    /// Exportera rapport till fil
    pub fn export_to_file(
        &self,
        kind: ReportKind,
        index: Option<usize>,
        path: &Path,
    ) -> Result<ReportResult> {
        let (bytes, row_count) = self.render(kind, index)?;
        write_file(path, &bytes)?;
        tracing::info!("Rapport {} skriven till {}", kind, path.display());

        Ok(ReportResult {
            kind,
            row_count,
            file_size: bytes.len(),
        })
    }

    /// Rendera till PDF-bytes; returnerar även antal rader
    pub fn render(&self, kind: ReportKind, index: Option<usize>) -> Result<(Vec<u8>, usize)> {
        let mut page = PageWriter::new(kind.display_name())?;

        let rows = if kind.is_single() {
            let index = index.ok_or_else(|| anyhow!("Le rapport {} exige une position", kind))?;
            let stored = self
                .store
                .get(kind.collection(), index)
                .ok_or_else(|| anyhow!("Fichier introuvable : {} #{}", kind.collection(), index))?;
            self.render_single(&mut page, kind, &stored.record);
            1
        } else {
            self.render_history(&mut page, kind)?
        };

        let bytes = page.finish()?;
        Ok((bytes, rows))
    }

    fn money(&self, amount: f64) -> String {
        format_amount(amount, self.currency)
    }

    fn render_single(&self, page: &mut PageWriter, kind: ReportKind, record: &Record) {
        page.band(kind.band_color(), 30.0);
        let title = kind.display_name().to_uppercase();
        let title_size = if matches!(kind, ReportKind::Receipt | ReportKind::Revision) {
            20.0
        } else {
            18.0
        };
        page.centered_white(&title, title_size, 18.0);

        let mut y = 45.0;
        let lines: Vec<String> = match record {
            Record::Receipt(q) => vec![
                format!("Locataire : {}", or_na(&q.tenant)),
                format!("Montant : {}", self.money(q.amount)),
                format!("Date : {}", format_optional_fr(q.date)),
            ],
            Record::Revision(r) => vec![
                format!("Bien : {}", or_na(&r.property)),
                format!("Ancien : {}", self.money(r.old_amount)),
                format!("Nouveau : {}", self.money(r.new_amount)),
                format!("Date : {}", format_optional_fr(r.date)),
            ],
            Record::Payment(e) => vec![
                format!("Date : {}", format_optional_fr(e.date)),
                format!("Locataire : {}", e.tenant),
                format!("Bien : {}", e.property),
                format!("Méthode : {}", e.method.label()),
                format!("Montant : {}", self.money(e.amount)),
            ],
            Record::Expense(d) => vec![
                format!("Date : {}", format_optional_fr(d.date)),
                format!("Catégorie : {}", d.category.label()),
                format!("Description : {}", d.description),
                format!("Montant : {}", self.money(d.amount)),
            ],
            other => vec![other.summary()],
        };

        for line in &lines {
            page.text(line, 12.0, 20.0, y, FontStyle::Normal);
            y += ROW_HEIGHT;
        }

        // Kvitton och revisioner får intygstext och signaturrad
        let attestation = match record {
            Record::Receipt(_) => Some("Cette quittance atteste le paiement du loyer."),
            Record::Revision(_) => Some("Cette révision atteste que le montant du loyer est modifié."),
            _ => None,
        };

        if let Some(attestation) = attestation {
            y += 4.0;
            page.text(attestation, 12.0, 20.0, y, FontStyle::Italic);
            y += 18.0;
            let done_at = format!("Fait à __________________, le {}", today_fr());
            page.text(&done_at, 12.0, 20.0, y, FontStyle::Normal);
            y += 20.0;
            page.text("Signature du propriétaire :", 12.0, 20.0, y, FontStyle::Normal);
            page.line(80.0, 150.0, y + 2.0);
        }
    }

    fn render_history(&self, page: &mut PageWriter, kind: ReportKind) -> Result<usize> {
        let collection = kind.collection();
        let mut records: Vec<&Record> = self
            .store
            .list(collection)
            .iter()
            .map(|s| &s.record)
            .collect();

        if records.is_empty() {
            bail!(kind.empty_message());
        }

        // Betalningar och utgifter skrivs ut nyast först
        if matches!(kind, ReportKind::PaymentHistory | ReportKind::ExpenseHistory) {
            records.sort_by(|a, b| sort_key(b.date()).cmp(&sort_key(a.date())));
        }

        page.band(kind.band_color(), 25.0);
        page.centered_white(kind.display_name(), 16.0, 15.0);
        page.text(
            &format!("Date du rapport : {}", today_fr()),
            11.0,
            14.0,
            34.0,
            FontStyle::Normal,
        );

        let columns: &[(&str, f32, bool)] = match kind {
            ReportKind::PaymentHistory => &[
                ("Date", 14.0, false),
                ("Locataire", 50.0, false),
                ("Bien", 110.0, false),
                ("Méthode", 150.0, false),
                ("Montant", 190.0, true),
            ],
            ReportKind::ExpenseHistory => &[
                ("Date", 14.0, false),
                ("Catégorie", 50.0, false),
                ("Description", 100.0, false),
                ("Montant", 190.0, true),
            ],
            ReportKind::ReceiptHistory => &[
                ("Locataire", 14.0, false),
                ("Montant", 100.0, false),
                ("Date", 160.0, false),
            ],
            _ => &[
                ("Bien", 14.0, false),
                ("Ancien", 80.0, false),
                ("Nouveau", 120.0, false),
                ("Date", 170.0, false),
            ],
        };

        let mut y = 46.0;
        for (title, x, right) in columns {
            page.cell(title, 11.0, *x, y, *right, FontStyle::Bold);
        }
        y += ROW_HEIGHT;

        let mut total = 0.0;
        for record in &records {
            let cells = self.history_cells(record);
            for ((_, x, right), value) in columns.iter().zip(&cells) {
                page.cell(value, 11.0, *x, y, *right, FontStyle::Normal);
            }
            if let Some(amount) = record.amount().filter(|a| a.is_finite()) {
                total += amount;
            }

            y += ROW_HEIGHT;
            if y > PAGE_BREAK_Y {
                page.add_page();
                y = CONTINUATION_Y;
            }
        }

        if matches!(kind, ReportKind::PaymentHistory | ReportKind::ExpenseHistory) {
            page.text("TOTAL :", 11.0, 140.0, y + 8.0, FontStyle::Bold);
            page.cell(&self.money(total), 11.0, 190.0, y + 8.0, true, FontStyle::Bold);
        }

        Ok(records.len())
    }

    fn history_cells(&self, record: &Record) -> Vec<String> {
        match record {
            Record::Payment(e) => vec![
                format_optional_fr(e.date),
                e.tenant.clone(),
                e.property.clone(),
                e.method.label().to_string(),
                self.money(e.amount),
            ],
            Record::Expense(d) => vec![
                format_optional_fr(d.date),
                d.category.label().to_string(),
                d.description.chars().take(40).collect(),
                self.money(d.amount),
            ],
            Record::Receipt(q) => vec![
                q.tenant.clone(),
                self.money(q.amount),
                format_optional_fr(q.date),
            ],
            Record::Revision(r) => vec![
                r.property.clone(),
                self.money(r.old_amount),
                self.money(r.new_amount),
                format_optional_fr(r.date),
            ],
            other => vec![other.summary()],
        }
    }
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        "N/A"
    } else {
        value
    }
}

#[derive(Debug, Clone, Copy)]
enum FontStyle {
    Normal,
    Bold,
    Italic,
}

/// Skrivhuvud över ett A4-dokument med de inbyggda Helvetica-typsnitten
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    font_italic: IndirectFontRef,
    pages: usize,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page1, layer1) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Calque 1");
        let layer = doc.get_page(page1).get_layer(layer1);

        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let font_bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let font_italic = doc.add_builtin_font(BuiltinFont::HelveticaOblique)?;

        Ok(Self {
            doc,
            layer,
            font,
            font_bold,
            font_italic,
            pages: 1,
        })
    }

    fn add_page(&mut self) {
        self.pages += 1;
        let (page, layer) = self.doc.add_page(
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            format!("Calque {}", self.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.set_color(0, 0, 0);
    }

    fn set_color(&self, r: u8, g: u8, b: u8) {
        self.layer.set_fill_color(rgb(r, g, b));
    }

    /// Färgat band över sidans topp
    fn band(&self, (r, g, b): (u8, u8, u8), height: f32) {
        self.set_color(r, g, b);
        self.layer.add_rect(Rect::new(
            Mm(0.0),
            Mm(PAGE_HEIGHT - height),
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
        ));
        self.set_color(0, 0, 0);
    }

    fn centered_white(&self, text: &str, size: f32, y: f32) {
        self.set_color(255, 255, 255);
        let x = PAGE_WIDTH / 2.0 - text_width(text, size) / 2.0;
        self.text(text, size, x, y, FontStyle::Bold);
        self.set_color(0, 0, 0);
    }

    fn text(&self, text: &str, size: f32, x: f32, y: f32, style: FontStyle) {
        let font = match style {
            FontStyle::Normal => &self.font,
            FontStyle::Bold => &self.font_bold,
            FontStyle::Italic => &self.font_italic,
        };
        self.layer
            .use_text(text, size, Mm(x), Mm(PAGE_HEIGHT - y), font);
    }

    /// Tabellcell; högerjusterad betyder att `x` är cellens högra kant
    fn cell(&self, text: &str, size: f32, x: f32, y: f32, right: bool, style: FontStyle) {
        let x = if right { x - text_width(text, size) } else { x };
        self.text(text, size, x, y, style);
    }

    fn line(&self, x1: f32, x2: f32, y: f32) {
        self.layer.set_outline_color(rgb(0, 0, 0));
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Mm(PAGE_HEIGHT - y)), false),
                (Point::new(Mm(x2), Mm(PAGE_HEIGHT - y)), false),
            ],
            is_closed: false,
        });
    }

    fn finish(self) -> Result<Vec<u8>> {
        self.doc.save_to_bytes().context("Impossible d'enregistrer le PDF")
    }
}

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

/// Uppskattad textbredd i mm (Helvetica, medelbredd ~0.5 em)
fn text_width(text: &str, size_pt: f32) -> f32 {
    const PT_TO_MM: f32 = 0.3528;
    text.chars().count() as f32 * size_pt * 0.5 * PT_TO_MM
}
