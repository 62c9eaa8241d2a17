//! PubMed baseline archive reader for citegraph.
//!
//! Turns a decompressed `PubmedArticleSet` document into
//! [`ArticleRecord`](citegraph_core::article::ArticleRecord)s. Pure
//! synchronous; no HTTP or database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use citegraph_core::archive::ArchiveNumber;
//! use citegraph_pubmed::{ExtractOptions, extract_from_reader};
//!
//! let xml = std::fs::read("pubmed21n0001.xml").unwrap();
//! let out = extract_from_reader(&xml[..], ArchiveNumber(1), &ExtractOptions::default())
//!   .unwrap();
//! println!("{} records, {} skipped", out.records.len(), out.stats.skipped);
//! ```

pub mod error;
mod extract;
pub mod tree;

pub use error::{Error, Result};
pub use extract::{
  ExtractOptions, ExtractStats, Extraction, extract, extract_from_reader,
  record_from_entry,
};

#[cfg(test)]
mod tests {
  use citegraph_core::archive::{ArchiveNumber, DecodedArchive};

  use super::*;

  const FILE: ArchiveNumber = ArchiveNumber(1);

  fn run(entries: &str) -> Extraction {
    let xml = format!(
      "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
       <!DOCTYPE PubmedArticleSet PUBLIC \"-//NLM//DTD PubMedArticle//EN\" \
       \"https://dtd.nlm.nih.gov/ncbi/pubmed/out/pubmed_190101.dtd\">\n\
       <PubmedArticleSet>{entries}</PubmedArticleSet>"
    );
    extract_from_reader(xml.as_bytes(), FILE, &ExtractOptions::default()).unwrap()
  }

  fn pubmed_data(id: &str, refs: &str) -> String {
    format!(
      "<PubmedData>\
         <ArticleIdList>\
           <ArticleId IdType=\"doi\">10.1000/{id}</ArticleId>\
           <ArticleId IdType=\"pubmed\">{id}</ArticleId>\
         </ArticleIdList>\
         {refs}\
       </PubmedData>"
    )
  }

  fn reference_list(ids: &[&str]) -> String {
    let refs: String = ids
      .iter()
      .map(|id| {
        format!(
          "<Reference><Citation>ref</Citation><ArticleIdList>\
           <ArticleId IdType=\"pubmed\">{id}</ArticleId></ArticleIdList></Reference>"
        )
      })
      .collect();
    format!("<ReferenceList>{refs}</ReferenceList>")
  }

  fn bare_entry(id: &str, refs: &[&str]) -> String {
    format!(
      "<PubmedArticle><MedlineCitation/>{}</PubmedArticle>",
      pubmed_data(id, &reference_list(refs))
    )
  }

  const FULL_ENTRY: &str = r#"
    <PubmedArticle>
      <MedlineCitation Status="MEDLINE" Owner="NLM">
        <PMID Version="1">31000001</PMID>
        <Article PubModel="Print">
          <Journal>
            <Title>The Journal of Examples</Title>
            <ISOAbbreviation>J Ex</ISOAbbreviation>
          </Journal>
          <ArticleTitle>Binding of <i>p53</i> to DNA.</ArticleTitle>
          <Abstract>
            <AbstractText Label="BACKGROUND">First section.</AbstractText>
            <AbstractText Label="RESULTS">Second section.</AbstractText>
          </Abstract>
          <AuthorList CompleteYN="Y">
            <Author ValidYN="Y"><LastName>Smith</LastName><ForeName>Jane</ForeName><Initials>J</Initials></Author>
            <Author ValidYN="Y"><LastName>Doe</LastName></Author>
            <Author ValidYN="Y"><CollectiveName>Example Consortium</CollectiveName></Author>
          </AuthorList>
          <Language>eng</Language>
        </Article>
        <MedlineJournalInfo>
          <Country>England</Country>
          <MedlineTA>J Ex</MedlineTA>
        </MedlineJournalInfo>
        <MeshHeadingList>
          <MeshHeading><DescriptorName UI="D1" MajorTopicYN="Y">DNA</DescriptorName></MeshHeading>
          <MeshHeading><DescriptorName UI="D2" MajorTopicYN="N">Humans</DescriptorName></MeshHeading>
          <MeshHeading><DescriptorName UI="D3" MajorTopicYN="Y">Tumor Suppressor Protein p53</DescriptorName></MeshHeading>
          <MeshHeading><DescriptorName UI="D4" MajorTopicYN="N">Protein Binding</DescriptorName></MeshHeading>
        </MeshHeadingList>
      </MedlineCitation>
      <PubmedData>
        <History>
          <PubMedPubDate PubStatus="received"><Year>2019</Year><Month>1</Month><Day>2</Day></PubMedPubDate>
          <PubMedPubDate PubStatus="pubmed"><Year>2019</Year><Month>4</Month><Day>9</Day></PubMedPubDate>
          <PubMedPubDate PubStatus="medline"><Year>2019</Year><Month>5</Month><Day>1</Day></PubMedPubDate>
        </History>
        <ArticleIdList>
          <ArticleId IdType="pubmed">31000001</ArticleId>
          <ArticleId IdType="doi">10.1000/example</ArticleId>
        </ArticleIdList>
        <ReferenceList>
          <Reference>
            <Citation>A.</Citation>
            <ArticleIdList><ArticleId IdType="pubmed">111</ArticleId></ArticleIdList>
          </Reference>
          <Reference>
            <Citation>B.</Citation>
            <ArticleIdList>
              <ArticleId IdType="doi">10.1000/b</ArticleId>
              <ArticleId IdType="pubmed">222</ArticleId>
            </ArticleIdList>
          </Reference>
          <Reference>
            <Citation>A again.</Citation>
            <ArticleIdList><ArticleId IdType="pubmed">111</ArticleId></ArticleIdList>
          </Reference>
        </ReferenceList>
      </PubmedData>
    </PubmedArticle>"#;

  // ── Full entry ──────────────────────────────────────────────────────────

  #[test]
  fn full_entry_populates_every_field() {
    let out = run(FULL_ENTRY);
    assert_eq!(out.records.len(), 1);
    let r = &out.records[0];

    assert_eq!(r.id.as_str(), "31000001");
    assert_eq!(r.title, "Binding of p53 to DNA.");
    assert_eq!(r.date, "04/09/2019");
    assert_eq!(r.abstract_text, "First section.");
    assert_eq!(r.journal, "J Ex");
    assert_eq!(r.authors, "Smith J, Doe, Example Consortium");
    assert_eq!(r.language, "eng");
    assert_eq!(r.country, "England");
    assert_eq!(r.major_topics, "DNA, Tumor Suppressor Protein p53");
    assert_eq!(r.minor_topics, "Humans, Protein Binding");
  }

  #[test]
  fn citations_keep_order_and_duplicates() {
    let out = run(FULL_ENTRY);
    assert_eq!(
      out.records[0].citations,
      ["111", "10.1000/b", "222", "111"]
    );
  }

  #[test]
  fn citation_id_types_filter_reference_identifiers() {
    let xml = format!("<PubmedArticleSet>{FULL_ENTRY}</PubmedArticleSet>");
    let options = ExtractOptions { citation_id_types: vec!["pubmed".into()] };
    let out = extract_from_reader(xml.as_bytes(), FILE, &options).unwrap();
    assert_eq!(out.records[0].citations, ["111", "222", "111"]);
  }

  #[test]
  fn self_citations_are_kept() {
    let out = run(&bare_entry("5", &["5", "6"]));
    assert_eq!(out.records[0].citations, ["5", "6"]);
  }

  // ── Defaults ────────────────────────────────────────────────────────────

  #[test]
  fn missing_sub_structures_fall_back_to_defaults() {
    let out = run(&bare_entry("77", &[]));
    let r = &out.records[0];
    assert_eq!(r.id.as_str(), "77");
    assert_eq!(r.title, "");
    assert_eq!(r.date, "");
    assert_eq!(r.abstract_text, "");
    assert_eq!(r.journal, "");
    assert_eq!(r.authors, "");
    assert_eq!(r.language, "");
    assert_eq!(r.country, "");
    assert!(r.citations.is_empty());
    assert_eq!(r.major_topics, "");
    assert_eq!(r.minor_topics, "");
  }

  #[test]
  fn missing_date_component_leaves_an_empty_slot() {
    let entry = format!(
      "<PubmedArticle>{}</PubmedArticle>",
      pubmed_data(
        "9",
        "<History><PubMedPubDate PubStatus=\"pubmed\">\
           <Year>2020</Year><Month>3</Month>\
         </PubMedPubDate></History>"
      )
    );
    assert_eq!(run(&entry).records[0].date, "03//2020");
  }

  #[test]
  fn last_publication_date_wins() {
    let entry = format!(
      "<PubmedArticle>{}</PubmedArticle>",
      pubmed_data(
        "9",
        "<History>\
           <PubMedPubDate PubStatus=\"pubmed\"><Year>2001</Year><Month>1</Month><Day>1</Day></PubMedPubDate>\
           <PubMedPubDate><Year>1999</Year></PubMedPubDate>\
           <PubMedPubDate PubStatus=\"pubmed\"><Year>2002</Year><Month>12</Month><Day>31</Day></PubMedPubDate>\
         </History>"
      )
    );
    assert_eq!(run(&entry).records[0].date, "12/31/2002");
  }

  #[test]
  fn abstract_without_text_is_empty() {
    let entry = format!(
      "<PubmedArticle><MedlineCitation><Article><Abstract><CopyrightInformation>c\
       </CopyrightInformation></Abstract></Article></MedlineCitation>{}</PubmedArticle>",
      pubmed_data("3", "")
    );
    assert_eq!(run(&entry).records[0].abstract_text, "");
  }

  #[test]
  fn empty_author_list_contributes_nothing() {
    let entry = format!(
      "<PubmedArticle><MedlineCitation><Article><AuthorList/></Article>\
       </MedlineCitation>{}</PubmedArticle>",
      pubmed_data("3", "")
    );
    assert_eq!(run(&entry).records[0].authors, "");
  }

  // ── Identifiers ─────────────────────────────────────────────────────────

  #[test]
  fn entries_without_an_id_are_skipped() {
    let no_id = "<PubmedArticle><MedlineCitation/><PubmedData><ArticleIdList>\
                 <ArticleId IdType=\"doi\">10.1/x</ArticleId></ArticleIdList>\
                 </PubmedData></PubmedArticle>";
    let no_data = "<PubmedArticle><MedlineCitation/></PubmedArticle>";
    let out = run(&format!("{no_id}{}{no_data}", bare_entry("1", &[])));

    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].id.as_str(), "1");
    assert_eq!(out.stats.entries, 3);
    assert_eq!(out.stats.skipped, 2);
    assert_eq!(out.stats.duplicates, 0);
  }

  #[test]
  fn empty_and_negative_ids_are_skipped() {
    let out = run(&format!(
      "{}{}{}",
      bare_entry("", &[]),
      bare_entry("-4", &[]),
      bare_entry("abc", &[])
    ));
    assert!(out.records.is_empty());
    assert_eq!(out.stats.skipped, 3);
  }

  #[test]
  fn duplicate_ids_keep_the_later_entry_in_the_first_slot() {
    let out = run(&format!(
      "{}{}{}",
      bare_entry("1", &["10"]),
      bare_entry("2", &[]),
      bare_entry("1", &["20", "30"])
    ));
    assert_eq!(out.records.len(), 2);
    assert_eq!(out.records[0].id.as_str(), "1");
    assert_eq!(out.records[0].citations, ["20", "30"]);
    assert_eq!(out.records[1].id.as_str(), "2");
    assert_eq!(out.stats.duplicates, 1);
  }

  #[test]
  fn reference_ids_never_key_the_record() {
    let entry = "<PubmedArticle><PubmedData><ReferenceList><Reference>\
                 <ArticleIdList><ArticleId IdType=\"pubmed\">8</ArticleId></ArticleIdList>\
                 </Reference></ReferenceList></PubmedData></PubmedArticle>";
    let out = run(entry);
    assert!(out.records.is_empty());
    assert_eq!(out.stats.skipped, 1);
  }

  #[test]
  fn book_entries_are_keyed_from_their_book_data() {
    let book = "<PubmedBookArticle>\
                <BookDocument>\
                  <PMID Version=\"1\">20301295</PMID>\
                  <ArticleTitle>Hereditary Breast Cancer</ArticleTitle>\
                  <ReferenceList><Reference><ArticleIdList>\
                    <ArticleId IdType=\"pubmed\">12345</ArticleId>\
                  </ArticleIdList></Reference></ReferenceList>\
                </BookDocument>\
                <PubmedBookData><ArticleIdList>\
                  <ArticleId IdType=\"bookaccession\">NBK1247</ArticleId>\
                  <ArticleId IdType=\"pubmed\">20301295</ArticleId>\
                </ArticleIdList></PubmedBookData>\
                </PubmedBookArticle>";
    let out = run(book);

    assert_eq!(out.stats.skipped, 0);
    assert_eq!(out.records.len(), 1);
    let r = &out.records[0];
    assert_eq!(r.id.as_str(), "20301295");
    assert_eq!(r.title, "Hereditary Breast Cancer");
    assert_eq!(r.citations, ["12345"]);
  }

  // ── Document-level failures ─────────────────────────────────────────────

  #[test]
  fn malformed_document_is_a_parse_error() {
    let xml = "<PubmedArticleSet><PubmedArticle><PubmedData></PubmedArticle>";
    let result = extract_from_reader(xml.as_bytes(), FILE, &ExtractOptions::default());
    assert!(result.is_err());
  }

  #[test]
  fn empty_set_yields_no_records() {
    let out = run("");
    assert!(out.records.is_empty());
    assert_eq!(out.stats, ExtractStats::default());
  }

  // ── Archive handle ──────────────────────────────────────────────────────

  #[test]
  fn extract_deletes_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pubmed21n0001.xml");
    std::fs::write(
      &path,
      format!("<PubmedArticleSet>{}</PubmedArticleSet>", bare_entry("1", &["2"])),
    )
    .unwrap();

    let out = extract(DecodedArchive::new(FILE, &path), &ExtractOptions::default())
      .unwrap();
    assert_eq!(out.records.len(), 1);
    assert!(!path.exists());
  }

  #[test]
  fn failed_extraction_still_deletes_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pubmed21n0001.xml");
    std::fs::write(&path, "<PubmedArticleSet><PubmedArticle>").unwrap();

    let result = extract(DecodedArchive::new(FILE, &path), &ExtractOptions::default());
    assert!(result.is_err());
    assert!(!path.exists());
  }
}
