//! `record!`: derive the record traits for an existing struct

/// Implements [`Record`](crate::Record), [`RecordType`](crate::RecordType)
/// and the field traits for a struct, so it can be dumped, loaded and
/// nested in other records.
///
/// Every struct field must be listed, in the order it should be serialized.
/// `=> meta` attaches [`FieldMeta`](crate::FieldMeta); `pre_load: [..]`
/// declares hooks on the type.
///
/// ```ignore
/// record! {
///     Account {
///         id: Uuid,
///         balance: Decimal => FieldMeta::decimal(2),
///         owner: Option<Person>,
///     }
///     pre_load: [strip_whitespace]
/// }
/// ```
#[macro_export]
macro_rules! record {
    (
        $ty:ident {
            $( $field:ident : $fty:ty $( => $meta:expr )? ),* $(,)?
        }
        $( pre_load: [ $( $hook:expr ),* $(,)? ] )?
    ) => {
        impl $crate::Record for $ty {
            fn read_field(&self, name: &str) -> ::std::option::Option<$crate::FieldRef<'_>> {
                match name {
                    $( stringify!($field) => ::std::option::Option::Some(
                        $crate::AsField::as_field(&self.$field)
                    ), )*
                    _ => ::std::option::Option::None,
                }
            }

            fn record_name(&self) -> &'static str {
                stringify!($ty)
            }
        }

        impl $crate::RecordType for $ty {
            const NAME: &'static str = stringify!($ty);

            fn declare() -> $crate::RecordDecl {
                let decl = $crate::RecordDecl::new()
                    $( .field_with::<$fty>(stringify!($field), $crate::record!(@meta $( $meta )?)) )*;
                $( $( let decl = decl.pre_load($hook); )* )?
                decl
            }

            #[allow(unused_mut)]
            fn construct(
                mut fields: $crate::LoadedFields,
            ) -> ::std::result::Result<Self, $crate::FieldError> {
                ::std::result::Result::Ok($ty {
                    $( $field: fields.take::<$fty>(stringify!($field))?, )*
                })
            }
        }

        impl $crate::Declared for $ty {
            fn declared_type() -> $crate::DeclaredType {
                $crate::DeclaredType::Record($crate::RecordTypeInfo::of::<$ty>())
            }
        }

        impl $crate::AsField for $ty {
            fn as_field(&self) -> $crate::FieldRef<'_> {
                $crate::FieldRef::Record(self)
            }
        }

        impl $crate::FromField for $ty {
            fn from_field(
                value: $crate::FieldValue,
            ) -> ::std::result::Result<Self, $crate::FieldError> {
                $crate::record::downcast_record::<$ty>(value)
            }
        }
    };
    (@meta) => {
        $crate::FieldMeta::default()
    };
    (@meta $meta:expr) => {
        $meta
    };
}
