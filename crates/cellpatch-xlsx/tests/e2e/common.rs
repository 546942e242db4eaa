//! Common utilities for E2E tests.
//!
//! Fixtures are assembled member by member so every test controls exactly
//! which parts exist and what they contain.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use cellpatch_xlsx::XlsxSession;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub const NS_DOC_RELS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

const CT_BASE: &str = "application/vnd.openxmlformats-officedocument";

/// Eight bytes of PNG signature followed by junk; only byte identity matters
pub const IMAGE_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDRcellpatch-test-image";

pub const IMAGE_PART: &str = "xl/media/image1.png";
pub const DATA_SHEET_PART: &str = "xl/worksheets/sheet1.xml";
pub const SUMMARY_SHEET_PART: &str = "xl/worksheets/sheet2.xml";
pub const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
pub const STYLES_PART: &str = "xl/styles.xml";
pub const CALC_CHAIN_PART: &str = "xl/calcChain.xml";
pub const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Wrap `<row>` elements into a minimal worksheet
pub fn sheet_xml(rows: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<worksheet xmlns="{}" xmlns:r="{}">"#,
            r#"<dimension ref="A1"/>"#,
            r#"<sheetViews><sheetView tabSelected="1" workbookViewId="0"/></sheetViews>"#,
            r#"<sheetFormatPr defaultRowHeight="15"/>"#,
            r#"<sheetData>{}</sheetData>"#,
            r#"<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>"#,
            r#"</worksheet>"#
        ),
        NS_MAIN, NS_DOC_RELS, rows
    )
}

/// Two strings: `Name` (0) and `Value` (1)
pub fn standard_shared_strings() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<sst xmlns="{}" count="3" uniqueCount="2">"#,
            r#"<si><t>Name</t></si><si><t>Value</t></si>"#,
            r#"</sst>"#
        ),
        NS_MAIN
    )
}

/// xf 0 is the default; xf 1 is bold red Arial 12
pub fn standard_styles() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<styleSheet xmlns="{}">"#,
            r#"<fonts count="2">"#,
            r#"<font><sz val="11"/><color theme="1"/><name val="Calibri"/><family val="2"/><scheme val="minor"/></font>"#,
            r#"<font><b/><sz val="12"/><color rgb="FFFF0000"/><name val="Arial"/><family val="2"/></font>"#,
            r#"</fonts>"#,
            r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
            r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
            r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
            r#"<cellXfs count="2">"#,
            r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
            r#"<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>"#,
            r#"</cellXfs>"#,
            r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
            r#"<dxfs count="0"/><tableStyles count="0" defaultTableStyle="TableStyleMedium2"/>"#,
            r#"</styleSheet>"#
        ),
        NS_MAIN
    )
}

/// Rows of the `Data` sheet
///
/// | A          | B        | C             |
/// |------------|----------|---------------|
/// | "Name"     | "Value"  | 3.5 (xf 1)    |
/// | 42         | TRUE     | =A2*2 (84)    |
/// | #DIV/0!    | "inline" |               |
pub const DATA_ROWS: &str = concat!(
    r#"<row r="1" spans="1:3"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" s="1"><v>3.5</v></c></row>"#,
    r#"<row r="2" spans="1:3"><c r="A2"><v>42</v></c><c r="B2" t="b"><v>1</v></c><c r="C2"><f>A2*2</f><v>84</v></c></row>"#,
    r#"<row r="3" spans="1:2"><c r="A3" t="e"><v>#DIV/0!</v></c><c r="B3" t="inlineStr"><is><t>inline</t></is></c></row>"#,
);

struct SheetDef {
    name: String,
    part: String,
    kind: &'static str,
    content_type: String,
    xml: String,
}

/// Assembles an .xlsx archive
pub struct WorkbookBuilder {
    sheets: Vec<SheetDef>,
    shared_strings: Option<String>,
    styles: Option<String>,
    calc_chain: Option<String>,
    extra: Vec<(String, Vec<u8>, CompressionMethod)>,
    extra_overrides: Vec<(String, String)>,
    prefixed: bool,
}

impl WorkbookBuilder {
    pub fn new() -> Self {
        Self {
            sheets: Vec::new(),
            shared_strings: None,
            styles: None,
            calc_chain: None,
            extra: Vec::new(),
            extra_overrides: Vec::new(),
            prefixed: false,
        }
    }

    /// `Data` and `Summary` worksheets, shared strings, styles, a calc chain
    /// and an image reachable from a drawing on `Data`
    pub fn standard() -> Self {
        let data = sheet_xml(DATA_ROWS).replace(
            "</worksheet>",
            r#"<drawing r:id="rId1"/></worksheet>"#,
        );
        let summary = sheet_xml(r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>"#);
        let calc_chain = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><calcChain xmlns="{}"><c r="C2" i="1"/></calcChain>"#,
            NS_MAIN
        );

        Self::new()
            .sheet("Data", &data)
            .sheet("Summary", &summary)
            .shared_strings(&standard_shared_strings())
            .styles(&standard_styles())
            .calc_chain(&calc_chain)
            .member(
                "xl/worksheets/_rels/sheet1.xml.rels",
                rels_xml(&[(
                    "rId1",
                    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing",
                    "../drawings/drawing1.xml",
                )]),
            )
            .member_with_type(
                "xl/drawings/drawing1.xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing"/>"#,
                &format!("{}.drawing+xml", CT_BASE),
            )
            .member(
                "xl/drawings/_rels/drawing1.xml.rels",
                rels_xml(&[(
                    "rId1",
                    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image",
                    "../media/image1.png",
                )]),
            )
            .stored_member(IMAGE_PART, IMAGE_BYTES)
    }

    /// One worksheet `Sheet1` holding `1` in A1, no shared strings, no styles
    pub fn bare() -> Self {
        Self::new().sheet("Sheet1", &sheet_xml(r#"<row r="1"><c r="A1"><v>1</v></c></row>"#))
    }

    pub fn sheet(mut self, name: &str, xml: &str) -> Self {
        let n = self.sheets.len() + 1;
        self.sheets.push(SheetDef {
            name: name.to_string(),
            part: format!("xl/worksheets/sheet{}.xml", n),
            kind: "worksheet",
            content_type: format!("{}.spreadsheetml.worksheet+xml", CT_BASE),
            xml: xml.to_string(),
        });
        self
    }

    pub fn chartsheet(mut self, name: &str) -> Self {
        let n = self.sheets.len() + 1;
        self.sheets.push(SheetDef {
            name: name.to_string(),
            part: format!("xl/chartsheets/sheet{}.xml", n),
            kind: "chartsheet",
            content_type: format!("{}.spreadsheetml.chartsheet+xml", CT_BASE),
            xml: format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><chartsheet xmlns="{}"><sheetViews><sheetView workbookViewId="0"/></sheetViews></chartsheet>"#,
                NS_MAIN
            ),
        });
        self
    }

    pub fn shared_strings(mut self, xml: &str) -> Self {
        self.shared_strings = Some(xml.to_string());
        self
    }

    pub fn styles(mut self, xml: &str) -> Self {
        self.styles = Some(xml.to_string());
        self
    }

    pub fn calc_chain(mut self, xml: &str) -> Self {
        self.calc_chain = Some(xml.to_string());
        self
    }

    /// Write `workbook.xml` with an `x:` prefix on every main-namespace element
    pub fn prefixed(mut self) -> Self {
        self.prefixed = true;
        self
    }

    /// Any other member, deflated
    pub fn member(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.extra
            .push((name.to_string(), data.into(), CompressionMethod::Deflated));
        self
    }

    fn member_with_type(mut self, name: &str, data: &str, content_type: &str) -> Self {
        self.extra_overrides
            .push((name.to_string(), content_type.to_string()));
        self.member(name, data)
    }

    /// Any other member, stored uncompressed
    pub fn stored_member(mut self, name: &str, data: &[u8]) -> Self {
        self.extra
            .push((name.to_string(), data.to_vec(), CompressionMethod::Stored));
        self
    }

    fn content_types(&self) -> String {
        let mut overrides = vec![(
            "xl/workbook.xml".to_string(),
            format!("{}.spreadsheetml.sheet.main+xml", CT_BASE),
        )];
        for sheet in &self.sheets {
            overrides.push((sheet.part.clone(), sheet.content_type.clone()));
        }
        if self.shared_strings.is_some() {
            overrides.push((
                SHARED_STRINGS_PART.to_string(),
                format!("{}.spreadsheetml.sharedStrings+xml", CT_BASE),
            ));
        }
        if self.styles.is_some() {
            overrides.push((
                STYLES_PART.to_string(),
                format!("{}.spreadsheetml.styles+xml", CT_BASE),
            ));
        }
        if self.calc_chain.is_some() {
            overrides.push((
                CALC_CHAIN_PART.to_string(),
                format!("{}.spreadsheetml.calcChain+xml", CT_BASE),
            ));
        }
        overrides.extend(self.extra_overrides.iter().cloned());

        let mut xml = String::from(concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Default Extension="png" ContentType="image/png"/>"#,
        ));
        for (part, content_type) in overrides {
            xml.push_str(&format!(
                r#"<Override PartName="/{}" ContentType="{}"/>"#,
                part, content_type
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn workbook(&self) -> String {
        let p = if self.prefixed { "x:" } else { "" };
        let decl = if self.prefixed { "xmlns:x" } else { "xmlns" };
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>{}<{p}workbook {}="{}" xmlns:r="{}"><{p}sheets>"#,
            "\n",
            decl,
            NS_MAIN,
            NS_DOC_RELS,
            p = p
        );
        for (i, sheet) in self.sheets.iter().enumerate() {
            xml.push_str(&format!(
                r#"<{p}sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                sheet.name,
                i + 1,
                i + 1,
                p = p
            ));
        }
        xml.push_str(&format!(
            r#"</{p}sheets><{p}calcPr calcId="191029"/></{p}workbook>"#,
            p = p
        ));
        xml
    }

    fn workbook_rels(&self) -> String {
        let mut rels: Vec<(String, String, String)> = self
            .sheets
            .iter()
            .enumerate()
            .map(|(i, s)| {
                (
                    format!("rId{}", i + 1),
                    format!("{}/{}", NS_DOC_RELS, s.kind),
                    s.part.trim_start_matches("xl/").to_string(),
                )
            })
            .collect();
        let mut next = rels.len() + 1;
        for (present, kind, target) in [
            (self.styles.is_some(), "styles", "styles.xml"),
            (self.shared_strings.is_some(), "sharedStrings", "sharedStrings.xml"),
            (self.calc_chain.is_some(), "calcChain", "calcChain.xml"),
        ] {
            if present {
                rels.push((
                    format!("rId{}", next),
                    format!("{}/{}", NS_DOC_RELS, kind),
                    target.to_string(),
                ));
                next += 1;
            }
        }
        let borrowed: Vec<(&str, &str, &str)> = rels
            .iter()
            .map(|(a, b, c)| (a.as_str(), b.as_str(), c.as_str()))
            .collect();
        rels_xml(&borrowed)
    }

    /// Write the archive into a fresh temp directory
    pub fn write(&self) -> Fixture {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("book.xlsx");

        let mut members: Vec<(String, Vec<u8>, CompressionMethod)> = vec![
            (
                CONTENT_TYPES_PART.to_string(),
                self.content_types().into_bytes(),
                CompressionMethod::Deflated,
            ),
            (
                "_rels/.rels".to_string(),
                rels_xml(&[(
                    "rId1",
                    format!("{}/officeDocument", NS_DOC_RELS).as_str(),
                    "xl/workbook.xml",
                )])
                .into_bytes(),
                CompressionMethod::Deflated,
            ),
            (
                "xl/workbook.xml".to_string(),
                self.workbook().into_bytes(),
                CompressionMethod::Deflated,
            ),
            (
                WORKBOOK_RELS_PART.to_string(),
                self.workbook_rels().into_bytes(),
                CompressionMethod::Deflated,
            ),
        ];
        for sheet in &self.sheets {
            members.push((
                sheet.part.clone(),
                sheet.xml.clone().into_bytes(),
                CompressionMethod::Deflated,
            ));
        }
        for (part, xml) in [
            (SHARED_STRINGS_PART, &self.shared_strings),
            (STYLES_PART, &self.styles),
            (CALC_CHAIN_PART, &self.calc_chain),
        ] {
            if let Some(xml) = xml {
                members.push((
                    part.to_string(),
                    xml.clone().into_bytes(),
                    CompressionMethod::Deflated,
                ));
            }
        }
        members.extend(self.extra.iter().cloned());

        let file = File::create(&path).expect("create fixture");
        let mut zip = ZipWriter::new(file);
        for (name, data, method) in &members {
            let options = SimpleFileOptions::default().compression_method(*method);
            zip.start_file(name.as_str(), options).expect("start member");
            zip.write_all(data).expect("write member");
        }
        zip.finish().expect("finish archive");

        Fixture { dir, path }
    }
}

/// A workbook on disk; the directory is removed on drop
pub struct Fixture {
    dir: TempDir,
    pub path: PathBuf,
}

impl Fixture {
    pub fn open(&self) -> XlsxSession {
        XlsxSession::open(&self.path).expect("open fixture")
    }

    /// A path next to the fixture, for `save_as`
    pub fn sibling(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

pub fn rels_xml(rels: &[(&str, &str, &str)]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>{}<Relationships xmlns="{}">"#,
        "\n", NS_PKG_RELS
    );
    for (id, rel_type, target) in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            id, rel_type, target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// Every member of an archive, decompressed
pub fn read_members(path: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut archive = ZipArchive::new(File::open(path).expect("open archive")).expect("read archive");
    let mut members = BTreeMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).expect("member");
        let mut data = Vec::new();
        file.read_to_end(&mut data).expect("read member");
        members.insert(file.name().to_string(), data);
    }
    members
}

/// Member names in archive order
#[allow(dead_code)]
pub fn member_order(path: &Path) -> Vec<String> {
    let mut archive = ZipArchive::new(File::open(path).expect("open archive")).expect("read archive");
    (0..archive.len())
        .map(|i| archive.by_index(i).expect("member").name().to_string())
        .collect()
}

pub fn member_text(path: &Path, name: &str) -> String {
    let members = read_members(path);
    let data = members
        .get(name)
        .unwrap_or_else(|| panic!("member {} missing", name));
    String::from_utf8(data.clone()).expect("utf-8 member")
}

/// Number of `<tag` openings (with or without attributes) in `xml`
pub fn count_elements(xml: &str, tag: &str) -> usize {
    xml.matches(&format!("<{}>", tag)).count()
        + xml.matches(&format!("<{} ", tag)).count()
        + xml.matches(&format!("<{}/>", tag)).count()
}
