use protclass_io::{read_table, write_table, Cell};
use protclass_test_data::TestFile;

#[test]
fn test_read_training_table() {
    let (path, _handle) = TestFile::train_table().create_temp().unwrap();
    let table = read_table(&path).unwrap();
    assert_eq!(table.n_rows(), 160);
    assert!(table.has_column("Residue Number"));
    assert!(table.has_column("label"));

    let pssm = table.column("PSSM_A").unwrap();
    assert!(matches!(&pssm.cells()[0], Cell::Text(s) if s.contains(',')));
    assert!(matches!(pssm.cells()[1], Cell::Number(_)));

    // blank ACC cells come back empty
    let acc = table.column("ACC").unwrap();
    assert!(acc.cells()[5].is_empty());
}

#[test]
fn test_fixture_survives_workbook_round_trip() {
    let (path, _handle) = TestFile::predict_table().create_temp().unwrap();
    let table = read_table(&path).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("predict.xlsx");
    write_table(&out, &table).unwrap();
    let back = read_table(&out).unwrap();
    assert_eq!(back.column_names(), table.column_names());
    assert_eq!(back.n_rows(), 3);
}
