use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Writes a small semantic grammar to a temp directory.
///
/// Base structures (count / 10 total): `(nn1)(number4)` 4, `(nn1_animal.n.01)(number4)` 2,
/// `(vv0)(nn1)` 2, `(nn1)` 1, `(number6)` 1.
pub fn write_grammar() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("config.json"), r#"{"tagtype": "semantic", "estimator": "mle"}"#).unwrap();
    fs::write(
        root.join("rules.tsv"),
        "(nn1)(number4)\t4\n(nn1_animal.n.01)(number4)\t2\n(vv0)(nn1)\t2\n(nn1)\t1\n(number6)\t1\n",
    )
    .unwrap();

    let nonterminals = root.join("nonterminals");
    fs::create_dir(&nonterminals).unwrap();
    write(&nonterminals, "nn1.tsv", "dog\t2\ncat\t1\nlove\t1\n");
    write(&nonterminals, "nn1_animal.n.01.tsv", "dog\t1\ncat\t1\n");
    write(&nonterminals, "vv0.tsv", "love\t3\nhug\t1\n");
    write(&nonterminals, "number4.tsv", "1999\t1\n2000\t1\n2010\t2\n");

    fs::write(root.join("noun_treecut.json"), r#"{"dog.n.01": ["animal.n.01"], "cat.n.01": ["animal.n.01"]}"#).unwrap();
    fs::write(root.join("verb_treecut.json"), "{}").unwrap();
    fs::write(root.join("pos_lexicon.tsv"), "dog\tnn1\ncat\tnn1\nlove\tnn1,vv0\nhug\tvv0\n").unwrap();
    fs::write(root.join("senses.tsv"), "dog\tn\tdog.n.01\ncat\tn\tcat.n.01\n").unwrap();
    dir
}

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}
