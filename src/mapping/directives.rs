//! Mapping directives read from custom attributes

use super::errors::MappingConflict;
use super::types::{MapFlags, MapStrategy};
use crate::graph::{attributes, ClassDef, PropertyDef};

/// `ShareColumns` settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareColumnsDirective {
    pub max_before_overflow: Option<u32>,
    pub apply_to_subclasses_only: bool,
}

/// Everything a class declares about its own mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapDirectives {
    pub strategy: Option<MapStrategy>,
    pub table_name: Option<String>,
    pub share_columns: Option<ShareColumnsDirective>,
    pub joined_table_per_direct_subclass: bool,
}

impl MapDirectives {
    pub fn read(class: &ClassDef) -> Result<Self, MappingConflict> {
        let mut directives = MapDirectives::default();

        if let Some(ca) = class.attribute(attributes::CLASS_MAP) {
            if let Some(value) = ca.get(attributes::MAP_STRATEGY) {
                let strategy = MapStrategy::parse(value).ok_or_else(|| {
                    MappingConflict::new(&class.name, format!("unknown map strategy '{}'", value))
                })?;
                directives.strategy = Some(strategy);
            }
            directives.table_name = ca
                .get(attributes::TABLE_NAME)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            if directives.strategy == Some(MapStrategy::ExistingTable)
                && directives.table_name.is_none()
            {
                return Err(MappingConflict::new(
                    &class.name,
                    "ExistingTable requires a TableName",
                ));
            }
        }

        if let Some(ca) = class.attribute(attributes::SHARE_COLUMNS) {
            let max_before_overflow = match ca.get(attributes::MAX_SHARED_COLUMNS_BEFORE_OVERFLOW) {
                Some(raw) => Some(parse_threshold(&class.name, raw)?),
                None => None,
            };
            directives.share_columns = Some(ShareColumnsDirective {
                max_before_overflow,
                apply_to_subclasses_only: ca.flag(attributes::APPLY_TO_SUBCLASSES_ONLY),
            });
        }

        directives.joined_table_per_direct_subclass = class
            .attribute(attributes::JOINED_TABLE_PER_DIRECT_SUBCLASS)
            .is_some();

        Ok(directives)
    }

    /// True when the class declares nothing about its mapping.
    pub fn is_empty(&self) -> bool {
        *self == MapDirectives::default()
    }

    pub fn flags(&self) -> MapFlags {
        MapFlags {
            joined_table_per_direct_subclass: self.joined_table_per_direct_subclass,
            share_columns: self.share_columns.is_some(),
            max_shared_columns_before_overflow: self
                .share_columns
                .and_then(|s| s.max_before_overflow),
            apply_to_subclasses_only: self
                .share_columns
                .map_or(false, |s| s.apply_to_subclasses_only),
        }
    }
}

fn parse_threshold(class: &str, raw: &str) -> Result<u32, MappingConflict> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(MappingConflict::new(
            class,
            format!("invalid MaxSharedColumnsBeforeOverflow '{}'", raw),
        )),
    }
}

/// Column constraints from a property's `PropertyMap` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnConstraints {
    pub nullable: bool,
    pub unique: bool,
}

impl ColumnConstraints {
    pub fn read(property: &PropertyDef) -> Self {
        match property.attribute(attributes::PROPERTY_MAP) {
            Some(ca) => ColumnConstraints {
                nullable: ca
                    .get(attributes::IS_NULLABLE)
                    .map_or(true, |v| !v.eq_ignore_ascii_case("false")),
                unique: ca.flag(attributes::IS_UNIQUE),
            },
            None => ColumnConstraints {
                nullable: true,
                unique: false,
            },
        }
    }

    pub fn is_constrained(&self) -> bool {
        !self.nullable || self.unique
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ClassKind, CustomAttribute, PrimitiveType};

    fn class_with(attrs: Vec<CustomAttribute>) -> ClassDef {
        let mut class = ClassDef::new("Element", ClassKind::Entity);
        class.custom_attributes = attrs;
        class
    }

    #[test]
    fn test_read_table_per_hierarchy_with_shared_columns() {
        let class = class_with(vec![
            CustomAttribute::new(attributes::CLASS_MAP)
                .with(attributes::MAP_STRATEGY, "TablePerHierarchy"),
            CustomAttribute::new(attributes::SHARE_COLUMNS)
                .with(attributes::MAX_SHARED_COLUMNS_BEFORE_OVERFLOW, "2")
                .with(attributes::APPLY_TO_SUBCLASSES_ONLY, "true"),
            CustomAttribute::new(attributes::JOINED_TABLE_PER_DIRECT_SUBCLASS),
        ]);
        let directives = MapDirectives::read(&class).unwrap();
        assert_eq!(directives.strategy, Some(MapStrategy::TablePerHierarchy));
        let flags = directives.flags();
        assert!(flags.share_columns);
        assert!(flags.apply_to_subclasses_only);
        assert!(flags.joined_table_per_direct_subclass);
        assert_eq!(flags.max_shared_columns_before_overflow, Some(2));
    }

    #[test]
    fn test_existing_table_requires_name() {
        let class = class_with(vec![CustomAttribute::new(attributes::CLASS_MAP)
            .with(attributes::MAP_STRATEGY, "ExistingTable")]);
        assert!(MapDirectives::read(&class).is_err());
    }

    #[test]
    fn test_bad_threshold_is_conflict() {
        let class = class_with(vec![CustomAttribute::new(attributes::SHARE_COLUMNS)
            .with(attributes::MAX_SHARED_COLUMNS_BEFORE_OVERFLOW, "lots")]);
        let err = MapDirectives::read(&class).unwrap_err();
        assert!(err.reason.contains("lots"));
    }

    #[test]
    fn test_property_map_constraints() {
        let mut prop = PropertyDef::primitive("Code", PrimitiveType::String);
        assert!(!ColumnConstraints::read(&prop).is_constrained());
        prop.custom_attributes.push(
            CustomAttribute::new(attributes::PROPERTY_MAP)
                .with(attributes::IS_NULLABLE, "false")
                .with(attributes::IS_UNIQUE, "true"),
        );
        let c = ColumnConstraints::read(&prop);
        assert!(!c.nullable);
        assert!(c.unique);
    }
}
