//! Known header spellings for each canonical field.
//!
//! English and Japanese spellings seen in test-case and screen-item
//! spreadsheets. Aliases are stored normalized (see
//! [`normalize_header`]) so lookups compare like with like.
//!
//! The default table is built once and never mutated, so it can be shared
//! by reference across threads.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::fuzzy::normalize_header;
use crate::models::CanonicalField;

/// Default alias table
pub static DEFAULT_ALIASES: Lazy<AliasTable> = Lazy::new(AliasTable::builtin);

/// Aliases per canonical field, normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasTable {
    entries: BTreeMap<CanonicalField, Vec<String>>,
}

impl AliasTable {
    /// Empty table, for callers that want full control.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in English/Japanese table.
    pub fn builtin() -> Self {
        use CanonicalField::*;

        let mut table = Self::new();
        table.extend(Id, &[
            "id", "test id", "test case id", "testcase id", "case id", "tc id", "tc no", "test no",
            "識別子", "テストid", "テストケースid", "ケースid", "試験id",
        ]);
        table.extend(Feature, &[
            "feature", "feature name", "function", "function name", "module", "screen",
            "screen name", "page", "area", "component",
            "機能", "機能名", "画面", "画面名", "モジュール", "大項目",
        ]);
        table.extend(Scenario, &[
            "scenario", "scenario name", "test case", "test case name", "test scenario", "title",
            "test title", "summary", "description", "case",
            "シナリオ", "テストケース", "テストケース名", "テスト項目", "確認項目", "概要", "タイトル",
            "中項目",
        ]);
        table.extend(Priority, &[
            "priority", "prio", "severity", "importance",
            "優先度", "重要度", "優先順位",
        ]);
        table.extend(Type, &[
            "type", "test type", "kind", "test kind", "category", "classification",
            "種別", "テスト種別", "区分", "分類", "タイプ",
        ]);
        table.extend(Status, &[
            "status", "result", "test result", "state", "outcome", "pass fail",
            "結果", "ステータス", "状態", "判定", "テスト結果",
        ]);
        table.extend(Precondition, &[
            "precondition", "preconditions", "pre condition", "pre conditions", "prerequisite",
            "prerequisites", "setup", "given",
            "前提条件", "事前条件", "前提",
        ]);
        table.extend(Instructions, &[
            "steps", "test steps", "step", "instructions", "procedure", "procedures", "actions",
            "when", "how to test",
            "手順", "操作手順", "テスト手順", "実施手順",
        ]);
        table.extend(Inputs, &[
            "input", "inputs", "input data", "input value", "test data", "data", "parameters",
            "入力", "入力値", "入力データ", "テストデータ", "パラメータ",
        ]);
        table.extend(Expected, &[
            "expected", "expected result", "expected results", "expected output",
            "expected behavior", "expected behaviour", "then",
            "期待結果", "期待値", "期待される結果", "期待動作",
        ]);
        table.extend(Endpoint, &[
            "endpoint", "api", "api endpoint", "url", "path", "route",
            "エンドポイント", "api名",
        ]);
        table.extend(Notes, &[
            "notes", "note", "remarks", "remark", "comments", "comment", "memo",
            "備考", "メモ", "コメント", "補足", "注記",
        ]);
        table.extend(No, &[
            "no", "#", "number", "num", "seq", "sequence",
            "番号", "項番", "連番",
        ]);
        table.extend(ItemName, &[
            "item name", "item", "items", "field name", "field", "element", "element name",
            "label", "control name",
            "項目名", "項目", "フィールド名", "要素名", "部品名", "ラベル",
        ]);
        table.extend(ItemType, &[
            "item type", "field type", "element type", "control type", "component type",
            "input type", "type",
            "項目種別", "項目タイプ", "種別", "タイプ", "部品種別",
        ]);
        table.extend(RequiredOptional, &[
            "required optional", "required", "mandatory", "required or optional",
            "mandatory optional",
            "必須", "必須任意", "必須 任意", "必須区分",
        ]);
        table.extend(DisplayConditions, &[
            "display conditions", "display condition", "visibility", "visible when", "show when",
            "表示条件", "表示制御",
        ]);
        table.extend(InputRestrictions, &[
            "input restrictions", "input restriction", "restrictions", "validation", "constraints",
            "input rules", "format", "max length",
            "入力制限", "入力制約", "入力チェック", "桁数",
        ]);
        table.extend(Action, &[
            "action", "event", "on click", "behavior", "behaviour",
            "アクション", "操作", "イベント", "動作",
        ]);
        table.extend(NavigationDestination, &[
            "navigation destination", "navigation", "destination", "navigate to", "transition",
            "next screen", "link to",
            "遷移先", "画面遷移", "遷移先画面",
        ]);
        table
    }

    /// Add one alias. Normalized on the way in; duplicates are ignored.
    pub fn add(&mut self, field: CanonicalField, alias: &str) {
        let alias = normalize_header(alias);
        if alias.is_empty() {
            return;
        }
        let list = self.entries.entry(field).or_default();
        if !list.contains(&alias) {
            list.push(alias);
        }
    }

    pub fn extend(&mut self, field: CanonicalField, aliases: &[&str]) {
        for alias in aliases {
            self.add(field, alias);
        }
    }

    /// Builder-style [`AliasTable::add`].
    pub fn with_alias(mut self, field: CanonicalField, alias: &str) -> Self {
        self.add(field, alias);
        self
    }

    pub fn aliases(&self, field: CanonicalField) -> &[String] {
        self.entries.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fields whose alias list holds exactly `normalized`, in field order.
    pub fn exact_fields(&self, normalized: &str) -> Vec<CanonicalField> {
        self.entries
            .iter()
            .filter(|(_, aliases)| aliases.iter().any(|a| a == normalized))
            .map(|(field, _)| *field)
            .collect()
    }

    /// Fields in field order with their aliases.
    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &[String])> + '_ {
        self.entries.iter().map(|(f, a)| (*f, a.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_has_aliases() {
        for field in CanonicalField::ALL {
            assert!(
                !DEFAULT_ALIASES.aliases(field).is_empty(),
                "{} has no aliases",
                field
            );
        }
    }

    #[test]
    fn test_aliases_are_normalized() {
        let table = AliasTable::new().with_alias(CanonicalField::RequiredOptional, "Required/Optional");
        assert_eq!(table.aliases(CanonicalField::RequiredOptional), ["required optional"]);
    }

    #[test]
    fn test_japanese_aliases_present() {
        assert!(DEFAULT_ALIASES.exact_fields("項目名").contains(&CanonicalField::ItemName));
        assert!(DEFAULT_ALIASES.exact_fields("結果").contains(&CanonicalField::Status));
    }

    #[test]
    fn test_ambiguous_alias_lists_both_fields() {
        assert_eq!(
            DEFAULT_ALIASES.exact_fields("type"),
            vec![CanonicalField::Type, CanonicalField::ItemType]
        );
    }

    #[test]
    fn test_duplicates_ignored() {
        let table = AliasTable::new()
            .with_alias(CanonicalField::Notes, "Memo")
            .with_alias(CanonicalField::Notes, "memo");
        assert_eq!(table.aliases(CanonicalField::Notes).len(), 1);
    }
}
