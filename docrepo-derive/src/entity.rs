use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_quote, Attribute, DataStruct, DeriveInput, Field, Fields, LitStr, Result, Token};

const DEFAULT_ID_FIELD: &str = "id";

pub(crate) fn generate_entity_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let name = &ast.ident;

    if !matches!(data.fields, Fields::Named(_)) {
        return Err(syn::Error::new_spanned(
            ast,
            format!("Cannot derive Entity for '{}': only structs with named fields are supported", name),
        ));
    }

    let mut collection: Option<LitStr> = None;
    let mut id_field_name: Option<String> = None;

    for attr in ast.attrs.iter().filter(|attr| attr.path().is_ident("entity")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") || meta.path.is_ident("name") {
                if collection.is_some() {
                    return Err(meta.error("Collection name given more than once"));
                }
                let value: LitStr = meta.value()?.parse()?;
                if value.value().trim().is_empty() {
                    return Err(syn::Error::new_spanned(&value, "Collection name cannot be empty"));
                }
                collection = Some(value);
                Ok(())
            } else if meta.path.is_ident("id") {
                if id_field_name.is_some() {
                    return Err(meta.error("Multiple id attributes are not allowed"));
                }
                meta.parse_nested_meta(|meta| {
                    if meta.path.is_ident("field") {
                        let value: LitStr = meta.value()?.parse()?;
                        id_field_name = Some(value.value());
                        Ok(())
                    } else {
                        Err(meta.error("Unknown id attribute, expected `field`"))
                    }
                })
            } else {
                Err(meta.error("Unknown entity attribute"))
            }
        })?;
    }

    let id_field_name = id_field_name.unwrap_or_else(|| DEFAULT_ID_FIELD.to_string());
    let id_field = data
        .fields
        .iter()
        .find(|field| field.ident.as_ref().is_some_and(|ident| ident == &id_field_name))
        .ok_or_else(|| {
            syn::Error::new_spanned(
                ast,
                format!(
                    "Field '{}' not found in struct '{}'; add it or set #[entity(id(field = \"...\"))]",
                    id_field_name, name
                ),
            )
        })?;

    let id_ident = &id_field.ident;
    let id_type = &id_field.ty;

    // bound generic entities through Self, not per parameter
    let mut generics = ast.generics.clone();
    if generics.type_params().next().is_some() {
        let predicates = &mut generics.make_where_clause().predicates;
        predicates.push(parse_quote! {
            Self: ::serde::Serialize + ::serde::de::DeserializeOwned + Send + Sync + 'static
        });
        predicates.push(parse_quote! {
            #id_type: ::serde::Serialize + Clone + PartialEq + ::std::fmt::Debug + Send + Sync + 'static
        });
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let id_key = document_key(&ast.attrs, id_field, &id_field_name);
    let entity_name = name.to_string();

    let collection_code = match collection {
        Some(collection) => quote! {
            fn collection_name() -> docrepo::errors::RepoResult<Option<docrepo::repository::CollectionName>> {
                Ok(Some(docrepo::repository::CollectionName::new(#collection)?))
            }
        },
        None => quote! {},
    };

    let gen = quote! {
        impl #impl_generics docrepo::repository::Entity for #name #ty_generics #where_clause {
            type Id = #id_type;

            fn id(&self) -> &Self::Id {
                &self.#id_ident
            }

            fn id_field() -> &'static str {
                #id_key
            }

            fn entity_name() -> &'static str {
                #entity_name
            }

            #collection_code
        }
    };

    Ok(TokenStream::from(gen))
}

/// Key under which serde writes `field`.
fn document_key(container_attrs: &[Attribute], field: &Field, field_name: &str) -> String {
    if let Some(rename) = serde_string(&field.attrs, "rename") {
        return rename;
    }
    match serde_string(container_attrs, "rename_all") {
        Some(rule) => apply_rename_rule(&rule, field_name),
        None => field_name.to_string(),
    }
}

/// Reads `#[serde(key = "value")]` or the `serialize` half of
/// `#[serde(key(serialize = "..", deserialize = ".."))]`. Anything else
/// inside `serde(...)` is skipped; serde itself reports malformed attributes.
fn serde_string(attrs: &[Attribute], key: &str) -> Option<String> {
    let mut found = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident(key) && meta.input.peek(Token![=]) {
                let value: LitStr = meta.value()?.parse()?;
                found = Some(value.value());
            } else if meta.path.is_ident(key) && meta.input.peek(syn::token::Paren) {
                meta.parse_nested_meta(|direction| {
                    let value: LitStr = direction.value()?.parse()?;
                    if direction.path.is_ident("serialize") {
                        found = Some(value.value());
                    }
                    Ok(())
                })?;
            } else if meta.input.peek(Token![=]) {
                let _: syn::Expr = meta.value()?.parse()?;
            } else if meta.input.peek(syn::token::Paren) {
                let content;
                syn::parenthesized!(content in meta.input);
                let _: proc_macro2::TokenStream = content.parse()?;
            }
            Ok(())
        });
    }
    found
}

fn apply_rename_rule(rule: &str, field_name: &str) -> String {
    let words: Vec<&str> = field_name.split('_').filter(|word| !word.is_empty()).collect();

    match rule {
        "lowercase" => field_name.to_lowercase(),
        "UPPERCASE" => field_name.to_uppercase(),
        "PascalCase" => words.iter().map(|word| capitalize(word)).collect(),
        "camelCase" => words
            .iter()
            .enumerate()
            .map(|(i, word)| if i == 0 { word.to_string() } else { capitalize(word) })
            .collect(),
        "SCREAMING_SNAKE_CASE" => field_name.to_uppercase(),
        "kebab-case" => field_name.replace('_', "-"),
        "SCREAMING-KEBAB-CASE" => field_name.replace('_', "-").to_uppercase(),
        _ => field_name.to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
