use crate::decode_column::ColumnMetadata;
use proc_macro2::TokenStream;
use quote::quote;

pub fn encode_column_def(column: &ColumnMetadata) -> TokenStream {
    let name = &column.name;
    let field = column.ident.to_string();
    let ty = &column.ty;
    let nullable = column.nullable;
    quote! {
        ::spool::ColumnDef {
            name: #name,
            field: #field,
            value: <#ty as ::spool::AsValue>::as_empty_value(),
            nullable: #nullable,
        }
    }
}
