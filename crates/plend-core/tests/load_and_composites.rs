//! Loading a survey export from disk and deriving composites from it.

use std::io::Write;

use approx::assert_relative_eq;
use plend_core::{
    CompositeGroup, CoreError, Dataset, FieldRole, MissingTokens, SurveySchema, build_composites,
};
use rstest::rstest;

fn write_csv(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write csv");
    file
}

fn survey_schema(groups: &[CompositeGroup]) -> SurveySchema {
    groups.iter().fold(
        SurveySchema::new()
            .score("ENT")
            .score("DEPNDT")
            .optional_score("BIZDEG")
            .demographic("tenure"),
        SurveySchema::item_group,
    )
}

#[test]
fn loads_file_and_appends_composites() {
    let groups = [
        CompositeGroup::numbered("EO", "EO", 2),
        CompositeGroup::numbered("RP", "RP", 2),
    ];
    let file = write_csv(
        "respondent,ENT,DEPNDT,tenure,EO1,EO2,RP1,RP2\n\
         a,4,3,12,5,3,2,NA\n\
         b,2,5,3,NA,NA,4,4\n\
         c,5,1,,1,2,.,.\n",
    );

    let mut dataset =
        Dataset::from_csv_path(file.path(), &survey_schema(&groups), &MissingTokens::default())
            .expect("load");
    let summaries = build_composites(&mut dataset, &groups).expect("composites");

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].undefined_rows, 1);
    assert_eq!(summaries[1].undefined_rows, 1);

    let eo = dataset.values(dataset.column_id("EO").unwrap());
    assert_relative_eq!(eo[0], 4.0);
    assert!(eo[1].is_nan());
    assert_relative_eq!(eo[2], 1.5);

    let rp = dataset.values(dataset.column_id("RP").unwrap());
    assert_relative_eq!(rp[0], 2.0);
    assert_relative_eq!(rp[1], 4.0);
    assert!(rp[2].is_nan());

    let tenure = dataset.column_id("tenure").unwrap();
    assert_eq!(dataset.role(tenure), FieldRole::Demographic);
    assert_eq!(dataset.missing_count(tenure), 1);
    assert_eq!(dataset.ids_with_role(FieldRole::Composite).count(), 2);
}

#[rstest]
#[case("ENT,DEPNDT,EO1,EO2,RP1\n1,2,3,4,5\n", "RP2")]
#[case("ENT,EO1,EO2,RP1,RP2\n1,2,3,4,5\n", "DEPNDT")]
fn missing_declared_items_fail_at_load(#[case] csv: &str, #[case] expected: &str) {
    let groups = [
        CompositeGroup::numbered("EO", "EO", 2),
        CompositeGroup::numbered("RP", "RP", 2),
    ];
    let file = write_csv(csv);
    let err = Dataset::from_csv_path(file.path(), &survey_schema(&groups), &MissingTokens::default())
        .expect_err("schema should reject the header");
    match err {
        CoreError::MissingColumn { column } => assert_eq!(column, expected),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn custom_missing_tokens_are_honoured() {
    let file = write_csv("ENT,DEPNDT\n-99,3\n2,-99\n");
    let tokens = MissingTokens::new(&["-99".to_string()]);
    let dataset = Dataset::from_csv_path(
        file.path(),
        &SurveySchema::new().score("ENT").score("DEPNDT"),
        &tokens,
    )
    .expect("load");
    let ent = dataset.column_id("ENT").unwrap();
    let dep = dataset.column_id("DEPNDT").unwrap();
    assert!(dataset.values(ent)[0].is_nan());
    assert!(dataset.values(dep)[1].is_nan());
    assert!(dataset.complete_rows(&[ent, dep]).is_empty());
}
