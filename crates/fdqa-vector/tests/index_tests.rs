use fdqa_core::traits::{Embedder, VectorIndex};
use fdqa_core::types::fields;
use fdqa_core::{Document, Error, MetadataFilter};
use fdqa_embed::FakeEmbedder;
use fdqa_vector::{LanceIndex, MemoryIndex};

fn corpus() -> Vec<Document> {
    vec![
        Document::new("a.json_0", "가맹비 500만원 교육비 별도")
            .with_meta(fields::BRAND_NAME, "X")
            .with_meta(fields::ATTRIBUTE_ID, 3),
        Document::new("a.json_1", "로열티 매출의 3퍼센트")
            .with_meta(fields::BRAND_NAME, "X")
            .with_meta(fields::ATTRIBUTE_ID, 4),
        Document::new("b.json_0", "가맹비 700만원 인테리어 포함")
            .with_meta(fields::BRAND_NAME, "Y")
            .with_meta(fields::ATTRIBUTE_ID, 3),
    ]
}

fn load(index: &dyn VectorIndex, embedder: &FakeEmbedder, docs: &[Document]) {
    let texts: Vec<String> = docs.iter().map(|d| d.text.clone()).collect();
    let vectors = embedder.embed_batch(&texts).unwrap();
    index.insert(docs, &vectors).unwrap();
}

fn exercise(index: &dyn VectorIndex) {
    let embedder = FakeEmbedder::new(64);
    assert_eq!(index.count().unwrap(), 0);
    assert!(index.search(&embedder.embed("가맹비").unwrap(), 3, None).unwrap().is_empty());

    load(index, &embedder, &corpus());
    assert_eq!(index.count().unwrap(), 3);

    let q = embedder.embed("로열티 매출의 3퍼센트").unwrap();
    let hits = index.search(&q, 2, None).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].document.id, "a.json_1", "exact text ranks first");
    assert!(hits[0].score >= hits[1].score);

    let f = MetadataFilter::new().field(fields::BRAND_NAME, "X").field(fields::ATTRIBUTE_ID, 3);
    let filtered = index.search(&q, 5, Some(&f)).unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].document.id, "a.json_0");
    assert_eq!(filtered[0].document.meta(fields::ATTRIBUTE_ID).map(|v| v.canonical()), Some("3".to_string()));

    let none = MetadataFilter::new().field(fields::BRAND_NAME, "Z");
    assert!(index.search(&q, 5, Some(&none)).unwrap().is_empty());

    let bad = MetadataFilter::new().field("nope", 1);
    assert!(matches!(index.search(&q, 5, Some(&bad)), Err(Error::InvalidInput(_))));

    // Re-inserting an id replaces the row
    let updated = vec![Document::new("a.json_1", "로열티 없음").with_meta(fields::BRAND_NAME, "X")];
    load(index, &embedder, &updated);
    assert_eq!(index.count().unwrap(), 3);
    let hits = index.search(&embedder.embed("로열티 없음").unwrap(), 1, None).unwrap();
    assert_eq!(hits[0].document.text, "로열티 없음");

    assert!(matches!(index.search(&[0.1, 0.2], 1, None), Err(Error::InvalidInput(_))));

    let zero = vec![0.0; 64];
    let blank = vec![Document::new("blank.json_0", "").with_meta(fields::ATTRIBUTE_ID, 3)];
    assert!(matches!(index.insert(&blank, &[zero.clone()]), Err(Error::InvalidInput(_))));
    assert_eq!(index.count().unwrap(), 3);
    assert!(matches!(index.search(&zero, 1, None), Err(Error::InvalidInput(_))));
}

#[test]
fn memory_index_semantics() {
    exercise(&MemoryIndex::new("contracts_collection"));
}

#[test]
fn lance_index_semantics() {
    let tmp = tempfile::tempdir().unwrap();
    let index = LanceIndex::open(&tmp.path().join("db"), "contracts_collection", true).unwrap();
    exercise(&index);
}

#[test]
fn lance_index_persists_across_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("db");
    let embedder = FakeEmbedder::new(32);
    {
        let index = LanceIndex::open(&path, "contracts_collection", true).unwrap();
        load(&index, &embedder, &corpus());
    }
    let index = LanceIndex::open(&path, "contracts_collection", false).unwrap();
    assert_eq!(index.count().unwrap(), 3);
    let other = LanceIndex::open(&path, "contracts_qa_collection", false).unwrap();
    assert_eq!(other.count().unwrap(), 0, "absent table reads as empty");
}

#[test]
fn opening_a_missing_database_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let err = LanceIndex::open(&tmp.path().join("missing"), "c", false).err().unwrap();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn memory_index_ties_keep_insertion_order() {
    let index = MemoryIndex::new("t");
    let docs = vec![Document::new("first", "same"), Document::new("second", "same")];
    index.insert(&docs, &[vec![1.0, 0.0], vec![1.0, 0.0]]).unwrap();
    let hits = index.search(&[1.0, 0.0], 2, None).unwrap();
    assert_eq!(hits[0].document.id, "first");
    assert_eq!(hits[1].document.id, "second");
}

#[test]
fn lance_rejects_blank_text_so_ranking_stays_finite() {
    let tmp = tempfile::tempdir().unwrap();
    let index = LanceIndex::open(&tmp.path().join("db"), "contracts_qa_collection", true).unwrap();
    let embedder = FakeEmbedder::new(32);
    let docs = vec![
        Document::new("x.json_0", "가맹비 a").with_meta(fields::ATTRIBUTE_ID, "3"),
        Document::new("x.json_1", "가맹비 b").with_meta(fields::ATTRIBUTE_ID, 4),
    ];
    load(&index, &embedder, &docs);

    let blank = vec![Document::new("y.json_0", "").with_meta(fields::ATTRIBUTE_ID, 3)];
    let blank_vec = embedder.embed_batch(&["".to_string()]).unwrap();
    assert!(matches!(index.insert(&blank, &blank_vec), Err(Error::InvalidInput(_))));

    let q = embedder.embed("가맹비 b").unwrap();
    let hits = index.search(&q, 3, None).unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.document.id.as_str()).collect();
    assert_eq!(ids, vec!["x.json_1", "x.json_0"]);
    assert!(hits.iter().all(|h| h.score.is_finite()));

    let f = MetadataFilter::new().field(fields::ATTRIBUTE_ID, 3);
    let filtered = index.search(&q, 3, Some(&f)).unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].document.id, "x.json_0");
}
